#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, FixedClock, Money, NewLoanCmd, SplitSpec};
use migration::MigratorTrait;
use uuid::Uuid;

pub const BANK_A: i16 = 1;
pub const BANK_B: i16 = 2;
pub const BANK_C: i16 = 3;

pub struct Fixture {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub alice: Uuid,
    pub bob: Uuid,
}

pub async fn engine_with_db() -> Fixture {
    engine_on("sqlite::memory:").await
}

/// A database file under the system temp dir. Its pool opens several
/// connections, so concurrent calls really overlap.
pub struct FileDb {
    pub fixture: Fixture,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub async fn engine_with_file_db() -> FileDb {
    let path = std::env::temp_dir().join(format!("easyfund-{}.db", Uuid::new_v4()));
    let fixture = engine_on(&format!("sqlite:{}?mode=rwc", path.display())).await;
    FileDb { fixture, path }
}

// The engine's dev-dependencies enable sea-orm's `mock` feature, which drops
// `Clone` from `DatabaseConnection`; clone the underlying pool handle instead.
fn clone_connection(db: &DatabaseConnection) -> DatabaseConnection {
    match db {
        DatabaseConnection::SqlxSqlitePoolConnection(conn) => {
            DatabaseConnection::SqlxSqlitePoolConnection(conn.clone())
        }
        _ => panic!("test fixtures only open SQLite connections"),
    }
}

async fn engine_on(url: &str) -> Fixture {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(clone_connection(&db))
        .clock(FixedClock(Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap()))
        .build()
        .await
        .unwrap();

    for (id, name) in [(BANK_A, "ABank"), (BANK_B, "SBank"), (BANK_C, "VBank")] {
        engine.new_bank(id, name).await.unwrap();
    }
    let alice = engine
        .new_user("alice@example.com", "Alice Doe", None, "password")
        .await
        .unwrap();
    let bob = engine
        .new_user("bob@example.com", "Bob Roe", Some("+7 900 000 00 00"), "secret")
        .await
        .unwrap();

    Fixture {
        engine: Arc::new(engine),
        db,
        alice,
        bob,
    }
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// The 1000.00 loan funded 600.00 by bank A and 400.00 by bank B.
pub async fn standard_loan(fx: &Fixture) -> engine::LoanDetail {
    fx.engine
        .create_loan(NewLoanCmd::new(
            fx.alice,
            money("1000.00"),
            vec![
                SplitSpec::new(BANK_A, money("600.00")),
                SplitSpec::new(BANK_B, money("400.00")),
            ],
        ))
        .await
        .unwrap()
}

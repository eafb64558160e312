use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;
use vbank::BankingClient;

mod error;
mod settings;

#[tokio::main]
async fn main() -> error::Result<()> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "easyfund={level},server={level},engine={level},vbank={level}",
            level = settings.app.level
        ))
        .init();

    let bank: Option<Arc<dyn BankingClient>> = match &settings.vbank {
        Some(vbank) => {
            tracing::info!(mock = vbank.mock, "Found virtual bank settings...");
            Some(Arc::from(vbank::client_for(
                vbank.mode(),
                &vbank.connection(),
            )?))
        }
        None => None,
    };

    if let Some(server) = settings.server {
        let bank = bank.clone();
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder().database(db).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            let mut state = server::ServerState::new(engine, server.admins);
            if let Some(bank) = bank {
                state = state.with_bank(bank);
            }
            if let Err(err) = server::run_with_listener(state, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    if let Some(bank) = bank {
        tasks.spawn(async move {
            if let Err(err) = check_vbank(bank.as_ref()).await {
                tracing::error!("virtual bank unavailable: {err}");
            }
        });
    }

    // The vbank check finishes on its own; only the server keeps running.
    while let Some(result) = tasks.join_next().await {
        if let Err(err) = result {
            tracing::error!("task failed: {err}");
            tasks.shutdown().await;
        }
    }

    Ok(())
}

/// Fetch a bank token once so bad credentials show up at startup.
async fn check_vbank(bank: &dyn BankingClient) -> error::Result<()> {
    bank.bank_token().await?;
    tracing::info!("virtual bank reachable");
    Ok(())
}

async fn parse_database(config: &settings::Database) -> error::Result<sea_orm::DatabaseConnection> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

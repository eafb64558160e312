//! Application settings, read from `settings.toml` and `EASYFUND_*`
//! environment variables (`EASYFUND_SERVER__PORT=8080`).

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub port: u16,
    pub bind: Option<String>,
    pub database: Database,
    /// Emails of the users allowed to approve or reject applications.
    #[serde(default)]
    pub admins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VBank {
    pub base_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Use fixed fixtures instead of the live API.
    #[serde(default)]
    pub mock: bool,
}

impl VBank {
    pub fn mode(&self) -> vbank::Mode {
        if self.mock {
            vbank::Mode::Mock
        } else {
            vbank::Mode::Live
        }
    }

    pub fn connection(&self) -> vbank::VBankSettings {
        vbank::VBankSettings {
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub vbank: Option<VBank>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("EASYFUND")
                    .separator("__")
                    .try_parsing(true),
            );
        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_settings() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "easyfund.db" }
            admins = ["ops@example.com"]

            [vbank]
            base_url = "https://vbank.example"
            client_id = "team"
            client_secret = "secret"
            mock = true
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert!(matches!(server.database, Database::Sqlite(ref p) if p == "easyfund.db"));
        assert_eq!(server.admins, vec!["ops@example.com".to_string()]);
        assert_eq!(settings.vbank.unwrap().mode(), vbank::Mode::Mock);
    }

    #[test]
    fn everything_is_optional() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert!(settings.vbank.is_none());
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            port = 0
            database = "memory"
            "#,
        );
        assert!(matches!(
            settings.server.unwrap().database,
            Database::Memory
        ));
    }
}

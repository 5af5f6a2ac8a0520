//! Handles settings for the application. Configuration is read from
//! `settings.toml` and can be overridden with `FLEXI__<SECTION>__<KEY>`
//! environment variables (e.g. `FLEXI__SERVER__PORT=8080`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the workspace crates (`trace`, `debug`, `info`, ...).
    pub level: String,
}

/// Where the ledger lives.
///
/// ```toml
/// database = "memory"
/// # or
/// database = { sqlite = "flexi.db" }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("FLEXI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn sqlite_database_is_a_table() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "flexi.db" }
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(matches!(server.database, Database::Sqlite(path) if path == "flexi.db"));
    }

    #[test]
    fn memory_database_is_a_string() {
        let settings = parse(
            r#"
            [app]
            level = "info"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = "memory"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.bind.as_deref(), Some("0.0.0.0"));
        assert!(matches!(server.database, Database::Memory));
    }

    #[test]
    fn server_section_is_optional() {
        let settings = parse("[app]\nlevel = \"warn\"\n");
        assert!(settings.server.is_none());
    }
}

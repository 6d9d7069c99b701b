use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use catalog::store::BackendConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// External base URL used when building links in responses. When empty,
    /// links are derived from the request's Host header.
    pub public_url: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Which persistence backend to use: `sqlite`, `json` or `memory`.
    pub backend: String,
    /// Connection URL for the `sqlite` backend.
    pub url: String,
    /// Document path for the `json` backend.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the uploaded file contents.
    pub upload_dir: PathBuf,
    /// Total storage capacity in bytes shared by all accounts.
    pub capacity: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Session token lifetime in days.
    pub token_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.public_url", "")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.backend", "sqlite")?
            .set_default("database.url", "sqlite://data/skiff.db?mode=rwc")?
            .set_default("database.path", "data/skiff.json")?
            .set_default("storage.upload_dir", "data/uploads")?
            // 50 GB, matching a small self-hosted box.
            .set_default("storage.capacity", 50u64 * 1024 * 1024 * 1024)?
            .set_default("auth.jwt_secret", "change-me")?
            .set_default("auth.token_days", 7)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SKIFF__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("SKIFF").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Translate the flat database section into a backend selector.
    pub fn backend(&self) -> Result<BackendConfig, ConfigError> {
        match self.database.backend.as_str() {
            "sqlite" => Ok(BackendConfig::Sql {
                url: self.database.url.clone(),
            }),
            "json" => Ok(BackendConfig::Json {
                path: PathBuf::from(&self.database.path),
            }),
            "memory" => Ok(BackendConfig::Memory),
            other => Err(ConfigError::Message(format!(
                "unknown database backend '{other}' (expected sqlite, json or memory)"
            ))),
        }
    }
}

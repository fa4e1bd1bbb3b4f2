use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 {
    20
}

/// Which object store hosts uploaded artifacts.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Filesystem,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket receiving package images and UI bundles.
    pub bucket: String,
    /// S3 endpoint, e.g. `http://minio:9000`.
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Base URL that artifact URLs are built from. Defaults to the endpoint.
    pub public_url: Option<String>,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("./data/artifacts")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            bucket: "plugin-packages".into(),
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            public_url: None,
            local_dir: default_local_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Maximum accepted archive size in bytes.
    pub max_archive_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_archive_size: 512 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 19090)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://registry.db?mode=rwc")?
            .set_default("storage.backend", "memory")?
            .set_default("storage.bucket", "plugin-packages")?
            .set_default("upload.max_archive_size", 512 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PKGREG__STORAGE__SECRET_KEY)
            .add_source(Environment::with_prefix("PKGREG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::MqAppConfig;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    pub id: String,
    /// Number of tasks processed concurrently. Default: 4.
    pub batch_size: usize,
}

/// Retry policy for failed tasks.
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_retries: u8,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub cleanup_interval_secs: u64,
    pub max_age_secs: u64,
}

/// Where built archives land and how long they are kept.
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    pub output_dir: String,
    pub retention_hours: u64,
}

/// Photo store backend selection.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// `filesystem` or `s3`.
    pub backend: String,
    /// Base directory for the filesystem backend.
    pub base_path: String,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

/// Chat HTTP API used for message delivery. Delivery is disabled while
/// the URL is unset.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatApiConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// External spreadsheet endpoint for daily stats rows.
#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub spreadsheet_url: Option<String>,
    pub token: Option<String>,
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    pub worker: WorkerConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    pub retry: RetryConfig,
    pub archive: ArchiveConfig,
    pub storage: StorageConfig,
    #[serde(default = "default_chat")]
    pub chat: ChatApiConfig,
    #[serde(default = "default_stats")]
    pub stats: StatsConfig,
}

fn default_chat() -> ChatApiConfig {
    ChatApiConfig {
        url: None,
        token: None,
    }
}

fn default_stats() -> StatsConfig {
    StatsConfig {
        spreadsheet_url: None,
        token: None,
    }
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("FOTOFLOW_CONFIG").unwrap_or_else(|_| "config/worker".to_string());

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.batch_size", 4_i64)?
            .set_default("retry.max_retries", 3_i64)?
            .set_default("retry.base_delay_ms", 1000_i64)?
            .set_default("retry.max_delay_ms", 60_000_i64)?
            .set_default("retry.cleanup_interval_secs", 300_i64)?
            .set_default("retry.max_age_secs", 3600_i64)?
            .set_default("archive.output_dir", "./archives")?
            .set_default("archive.retention_hours", 24_i64)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.base_path", "./photos")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("FOTOFLOW").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

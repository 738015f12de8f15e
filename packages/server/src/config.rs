use common::config::MqAppConfig;
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
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Archive pipeline knobs. The worker owns the output directory and
/// retention; the server only stamps the build deadline into jobs.
#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// How long a build may run before it is considered stuck.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Products in the warehouse longer than this many days are
    /// promoted to priority by the nightly sweep.
    pub priority_age_days: i64,
    /// Number of defects on one barcode that triggers an alert.
    pub defect_alert_count: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Chat group that receives studio-wide alerts.
    pub alert_chat_id: Option<i64>,
    /// Shared secret embedded in the inbound webhook path. The webhook
    /// is disabled while unset.
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mq: MqAppConfig,
    pub archive: ArchiveConfig,
    pub workflow: WorkflowConfig,
    pub chat: ChatConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("archive.timeout_secs", 1800)?
            .set_default("workflow.priority_age_days", 14)?
            .set_default("workflow.defect_alert_count", 3)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FOTOFLOW__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("FOTOFLOW").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

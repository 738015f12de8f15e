use std::sync::Arc;

use mq::MqQueue;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// Absent when the queue is disabled in config; handlers degrade
    /// to synchronous-only behavior.
    pub mq: Option<MqQueue>,
    pub config: Arc<AppConfig>,
    pub notifier: Notifier,
}

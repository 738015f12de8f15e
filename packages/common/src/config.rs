use serde::Deserialize;

/// App-level MQ configuration shared by the server and the worker.
#[derive(Debug, Deserialize, Clone)]
pub struct MqAppConfig {
    /// Whether MQ is enabled. Default: true.
    /// Note: the worker ignores this field (it always requires MQ).
    #[serde(default = "default_mq_enabled")]
    pub enabled: bool,
    /// Redis connection URL. Default: "redis://localhost:6379".
    #[serde(default = "default_mq_url")]
    pub url: String,
    /// Connection pool size. Default: 5.
    #[serde(default = "default_mq_pool_size")]
    pub pool_size: u8,
    /// Queue for worker tasks (server publishes, worker consumes).
    /// Default: "studio_tasks".
    #[serde(default = "default_mq_task_queue")]
    pub task_queue_name: String,
    /// Queue for archive results (worker publishes, server consumes).
    /// Default: "archive_results".
    #[serde(default = "default_mq_result_queue")]
    pub result_queue_name: String,
}

fn default_mq_enabled() -> bool {
    true
}
fn default_mq_url() -> String {
    "redis://localhost:6379".into()
}
fn default_mq_pool_size() -> u8 {
    5
}
fn default_mq_task_queue() -> String {
    "studio_tasks".into()
}
fn default_mq_result_queue() -> String {
    "archive_results".into()
}

impl Default for MqAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_mq_enabled(),
            url: default_mq_url(),
            pool_size: default_mq_pool_size(),
            task_queue_name: default_mq_task_queue(),
            result_queue_name: default_mq_result_queue(),
        }
    }
}

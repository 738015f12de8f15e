use serde::{Deserialize, Serialize};

/// Task types understood by the worker.
pub const TASK_ARCHIVE: &str = "archive";
pub const TASK_NOTIFY: &str = "notify";
pub const TASK_STATS_EXPORT: &str = "stats_export";

/// Generic task envelope published to the worker queue.
///
/// The worker dispatches on `task_type` and deserializes `payload` into the
/// matching message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_type: String,
    pub payload: serde_json::Value,
}

impl Task {
    /// Wrap a typed message into a task envelope.
    pub fn wrap<M: crate::mq::Message>(
        task_type: &str,
        message: &M,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: message.message_id().to_string(),
            task_type: task_type.to_string(),
            payload: serde_json::to_value(message)?,
        })
    }
}

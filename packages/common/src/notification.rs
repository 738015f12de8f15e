use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mq::Message;

/// A rendered chat message queued for fire-and-forget delivery.
///
/// Business handlers never talk to the chat API directly; they emit domain
/// events which the server's notifier renders into these messages after the
/// owning transaction commits. The worker delivers them and drops failures
/// after logging.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Delivery identifier (UUID), for logging only.
    pub message_id: String,
    /// Target chat id in the messenger.
    pub chat_id: i64,
    /// Message body, plain text.
    pub text: String,
}

impl ChatMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            chat_id,
            text: text.into(),
        }
    }
}

impl Message for ChatMessage {
    fn message_type() -> &'static str {
        "chat_message"
    }

    fn message_id(&self) -> &str {
        &self.message_id
    }
}

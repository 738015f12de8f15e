use common::notification::ChatMessage;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ChatApiConfig;

/// Deliver one chat message through the chat HTTP API. Fire-and-forget:
/// failures are logged and the message is dropped.
pub async fn handle_chat_message(
    client: &reqwest::Client,
    config: &ChatApiConfig,
    message: &ChatMessage,
) {
    let Some(ref url) = config.url else {
        debug!(message_id = %message.message_id, "Chat API not configured, dropping message");
        return;
    };

    let mut request = client.post(url).json(&json!({
        "chat_id": message.chat_id,
        "text": message.text,
    }));
    if let Some(ref token) = config.token {
        request = request.bearer_auth(token);
    }

    match request.send().await {
        Ok(response) if response.status().is_success() => {
            info!(
                message_id = %message.message_id,
                chat_id = message.chat_id,
                "Delivered chat message"
            );
        }
        Ok(response) => {
            warn!(
                message_id = %message.message_id,
                chat_id = message.chat_id,
                status = %response.status(),
                "Chat API rejected message, dropping"
            );
        }
        Err(e) => {
            warn!(
                message_id = %message.message_id,
                chat_id = message.chat_id,
                error = %e,
                "Chat delivery failed, dropping"
            );
        }
    }
}

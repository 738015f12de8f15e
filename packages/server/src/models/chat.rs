use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Inbound webhook payload linking a chat account to a user.
///
/// Command dispatching lives in the bot itself; the backend only needs
/// the linkage so notifications can find the right chat.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChatLinkRequest {
    /// Messenger chat id.
    #[schema(example = 773312)]
    pub chat_id: i64,
    /// Display name in the messenger.
    pub chat_name: Option<String>,
    /// Username of the account to link.
    #[schema(example = "alice_stock")]
    pub username: String,
    /// Phone number shared by the messenger, optional.
    pub phone: Option<String>,
}

pub fn validate_chat_link_request(payload: &ChatLinkRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    Ok(())
}

/// Webhook acknowledgement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ChatLinkResponse {
    pub linked: bool,
    pub user_id: i32,
}

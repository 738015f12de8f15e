use axum::Json;
use axum::extract::{Path, State};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{user, user_profile};
use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::chat::{ChatLinkRequest, ChatLinkResponse, validate_chat_link_request};
use crate::state::AppState;

/// Inbound chat webhook: link a messenger chat to a user account.
///
/// The bot dispatches its own commands; the backend only records the
/// chat linkage so the notifier can reach people.
#[instrument(skip(state, secret, payload), fields(username = %payload.username))]
pub async fn webhook(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    AppJson(payload): AppJson<ChatLinkRequest>,
) -> Result<Json<ChatLinkResponse>, AppError> {
    // Wrong or missing secret looks identical to a missing route.
    match state.config.chat.webhook_secret.as_deref() {
        Some(expected) if expected == secret => {}
        _ => return Err(AppError::NotFound("Not found".into())),
    }

    validate_chat_link_request(&payload)?;

    let account = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.username)))?;

    let existing = user_profile::Entity::find()
        .filter(user_profile::Column::UserId.eq(account.id))
        .one(&state.db)
        .await?;

    match existing {
        Some(profile) => {
            let mut active: user_profile::ActiveModel = profile.into();
            active.chat_id = Set(Some(payload.chat_id));
            active.chat_name = Set(payload.chat_name);
            if payload.phone.is_some() {
                active.phone = Set(payload.phone);
            }
            active.update(&state.db).await?;
        }
        None => {
            let profile = user_profile::ActiveModel {
                user_id: Set(account.id),
                chat_id: Set(Some(payload.chat_id)),
                chat_name: Set(payload.chat_name),
                phone: Set(payload.phone),
                on_duty: Set(false),
                ..Default::default()
            };
            profile.insert(&state.db).await?;
        }
    }

    info!(user_id = account.id, chat_id = payload.chat_id, "Chat account linked");

    Ok(Json(ChatLinkResponse {
        linked: true,
        user_id: account.id,
    }))
}

//! Chat webhook handler
//!
//! A messaging gateway posts each inbound message here and relays the reply.

use std::sync::Arc;

use axum::{extract::State, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use struk_core::chat::IncomingMessage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<ChatMedia>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMedia {
    pub mimetype: String,
    /// Base64-encoded bytes
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub reply: String,
}

/// POST /chat/messages - Handle one inbound chat message
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, AppError> {
    let user_id = body
        .user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("userId is required"))?;

    let message = match body.media {
        Some(media) => {
            let data = base64::engine::general_purpose::STANDARD
                .decode(media.data.trim())
                .map_err(|_| AppError::bad_request("media.data must be base64"))?;
            if data.len() > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "Media too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }
            let mut message = IncomingMessage::media(user_id, media.mimetype, data);
            message.text = body.text.unwrap_or_default();
            message
        }
        None => IncomingMessage::text(user_id, body.text.unwrap_or_default()),
    };

    let reply = state.chat.handle(&message).await;
    Ok(Json(ChatMessageResponse { reply }))
}

//! Instagram inbox endpoints.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use super::{saved, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::auth::AuthUser;
use crate::models::{InboxAction, InboxQuery, SocialMessage};
use crate::AppState;

/// GET /api/social/instagram - `?status=`, `?assignedTo=`, `?id=`.
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiQuery(query): ApiQuery<InboxQuery>,
) -> ApiResult<Response> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.trim().is_empty()) {
        let message = state.repo.messages.get(id.trim()).await?;
        return Ok(Json(message).into_response());
    }
    let messages = state.repo.list_messages(&query).await?;
    Ok(Json(messages).into_response())
}

/// POST /api/social/instagram - Apply one `action`-tagged triage operation.
pub async fn post_message_action(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(action): ApiJson<InboxAction>,
) -> ApiResult<impl IntoResponse> {
    let (message, outcome) = state.repo.apply_inbox_action(action, &claims).await?;
    tracing::debug!(message_id = %message.id, user_id = %claims.id, "Inbox action applied");
    Ok(saved(message, outcome))
}

/// DELETE /api/social/instagram/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<SocialMessage>> {
    let message = state.repo.messages.delete(&id).await?;
    tracing::info!(message_id = %message.id, user_id = %claims.id, "Message deleted");
    Ok(Json(message))
}

//! Login and session endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiJson, ApiResult};
use crate::auth::{burn_verification, session_cookie, verify_password, AuthUser, Claims};
use crate::db::session_record;
use crate::errors::{messages, AppError};
use crate::models::{User, UserView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(messages::INVALID_CREDENTIALS.to_string())
}

/// The password is always checked first, against a dummy hash when the email
/// is unknown, so every refusal costs the same.
fn authenticate(candidate: Option<User>, password: &str) -> Result<User, AppError> {
    let Some(user) = candidate else {
        burn_verification(password);
        return Err(invalid_credentials());
    };

    let verified = verify_password(password, &user.password);
    if !verified || !user.active {
        tracing::info!(user_id = %user.id, "Login refused");
        return Err(invalid_credentials());
    }
    Ok(user)
}

/// POST /api/auth/login
///
/// Unknown email, wrong password and inactive account are indistinguishable
/// to the caller.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let candidate = state.repo.find_login(&request.email).await?;
    let user = authenticate(candidate, &request.password)?;

    let now = Utc::now();
    let (token, claims) = state.tokens.issue(&user, now)?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Err(e) = state
        .repo
        .record_session(session_record(&claims, now, user_agent))
        .await
    {
        tracing::warn!(user_id = %user.id, "Failed to record session: {}", e);
    }

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Login");

    let cookie = session_cookie(&token, claims.exp - claims.iat);
    let body = LoginResponse {
        token,
        expires_at: claims.expires_at(),
        user: UserView::from(&user),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// GET /api/auth/session
pub async fn current_session(AuthUser(claims): AuthUser) -> Json<Claims> {
    Json(claims)
}

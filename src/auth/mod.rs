//! Session authentication and role gates.
//!
//! Handlers declare what they need by extractor: [`AuthUser`] for any signed-in
//! role, [`AdminUser`] for admin-only routes. A missing or invalid session is
//! `Unauthorized`; a valid session with the wrong role is `Forbidden`.

mod password;
mod token;

pub use password::*;
pub use token::*;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::errors::{messages, AppError};
use crate::AppState;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "session_token";

/// Any authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|s| !s.is_empty())
}

/// Verify the request's session from headers.
pub fn verify_session(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<Claims, AppError> {
    let token = bearer_token(headers)
        .or_else(|| cookie_token(headers))
        .ok_or_else(|| AppError::Unauthorized(messages::UNAUTHORIZED.to_string()))?;
    tokens.verify(&token)
}

/// `Set-Cookie` value for a freshly issued token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify_session(&parts.headers, &state.tokens).map(AuthUser)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify_session(&parts.headers, &state.tokens)?;
        if !claims.is_admin() {
            tracing::info!(user_id = %claims.id, "Admin route refused for agent");
            return Err(AppError::Forbidden(messages::FORBIDDEN.to_string()));
        }
        Ok(AdminUser(claims))
    }
}

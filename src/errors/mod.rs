//! Error handling module for the travel back-office.
//!
//! Provides centralized error types with mapping to HTTP status codes and
//! the `{ "error": ..., "details": [...] }` response body.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// User-facing messages.
pub mod messages {
    pub const UNAUTHORIZED: &str = "Não autorizado";
    pub const INVALID_CREDENTIALS: &str = "Credenciais inválidas";
    pub const FORBIDDEN: &str = "Acesso negado";
    pub const VALIDATION_FAILED: &str = "Dados inválidos";
    pub const INTERNAL: &str = "Erro interno do servidor";
    pub const STORE: &str = "Erro ao acessar o armazenamento";
    pub const EMAIL_IN_USE: &str = "Email já cadastrado";
    pub const LAST_ADMIN: &str = "Não é possível desativar o último administrador ativo";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid or expired session
    Unauthorized(String),
    /// Authenticated but the role is not allowed
    Forbidden(String),
    /// Payload failed validation; `details` lists every violated rule
    Validation {
        message: String,
        details: Vec<String>,
    },
    /// Resource not found
    NotFound(String),
    /// Uniqueness or last-admin rule violated
    Conflict(String),
    /// Malformed request (bad query string, unreadable JSON)
    BadRequest(String),
    /// Third-party API failure
    Upstream(String),
    /// Key-value store failure
    Database(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    pub fn validation(details: Vec<String>) -> Self {
        AppError::Validation {
            message: messages::VALIDATION_FAILED.to_string(),
            details,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Validation { message, .. } => message.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Upstream(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }

    /// Message shown to the client. Server-side failures never leak internals.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) => messages::STORE.to_string(),
            AppError::Upstream(_) | AppError::Internal(_) => messages::INTERNAL.to_string(),
            _ => self.message(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code().as_u16(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Database(format!("Stored JSON is unreadable: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("Rejected session token: {:?}", err);
        AppError::Unauthorized(messages::UNAUTHORIZED.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("JSON inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Parâmetros inválidos: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Validation { details, .. } => Some(details.clone()),
            _ => None,
        };

        Self {
            error: error.public_message(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_carries_details() {
        let err = AppError::validation(vec!["destino é obrigatório".to_string()]);
        let body = serde_json::to_value(ErrorResponse::new(&err)).unwrap();
        assert_eq!(body["error"], messages::VALIDATION_FAILED);
        assert_eq!(body["details"][0], "destino é obrigatório");
    }

    #[test]
    fn test_database_error_is_not_leaked() {
        let err = AppError::Database("disk I/O error at /var/lib/x".to_string());
        let body = serde_json::to_value(ErrorResponse::new(&err)).unwrap();
        assert_eq!(body["error"], messages::STORE);
        assert!(body.get("details").is_none());
    }
}

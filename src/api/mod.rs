//! REST API module.
//!
//! Handlers per resource. Successful responses carry the resource as plain
//! JSON; failures go through [`AppError`] so every error body has the same
//! shape.

mod auth;
mod employees;
mod images;
mod maintenance;
mod promos;
mod reviews;
mod social;
mod users;

pub use auth::*;
pub use employees::*;
pub use images::*;
pub use maintenance::*;
pub use promos::*;
pub use reviews::*;
pub use social::*;
pub use users::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::Upsert;
use crate::errors::AppError;

/// `Json` whose rejection is an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejection is an [`AppError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

pub type ApiResult<T> = Result<T, AppError>;

/// `?id=` on collection routes.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

impl IdQuery {
    /// The id to act on, or a validation error naming the missing field.
    pub fn require(self) -> Result<String, AppError> {
        self.id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::validation(vec!["id: identificador é obrigatório".to_string()])
            })
    }
}

/// 201 for a newly created record, 200 for a replaced one.
pub fn saved<T: Serialize>(value: T, outcome: Upsert) -> (StatusCode, Json<T>) {
    let status = match outcome {
        Upsert::Created => StatusCode::CREATED,
        Upsert::Updated => StatusCode::OK,
    };
    (status, Json(value))
}

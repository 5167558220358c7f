//! Image search endpoint.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{ApiQuery, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::images::ImageResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/images/search?query=
pub async fn search_images(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiQuery(params): ApiQuery<ImageQuery>,
) -> ApiResult<Json<ImageResult>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(AppError::validation(vec![
            "query: termo de busca é obrigatório".to_string(),
        ]));
    }
    Ok(Json(state.images.search(query).await))
}

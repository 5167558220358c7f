//! Performance review API endpoints.
//!
//! Agents may read their own reviews; everything else is admin only.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use super::{saved, ApiJson, ApiPath, ApiQuery, ApiResult, IdQuery};
use crate::auth::{AdminUser, AuthUser};
use crate::errors::{messages, AppError};
use crate::models::{PerformanceReview, ReviewPayload, ReviewQuery};
use crate::AppState;

/// GET /api/employees/performance - `?userId=`, `?period=`, `?id=`.
pub async fn list_reviews(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> ApiResult<Response> {
    // Agents are pinned to their own reviews
    let user_id = if claims.is_admin() {
        query.user_id.clone().filter(|s| !s.is_empty())
    } else {
        match query.user_id.as_deref().filter(|s| !s.is_empty()) {
            Some(other) if other != claims.id => {
                return Err(AppError::Forbidden(messages::FORBIDDEN.to_string()))
            }
            _ => Some(claims.id.clone()),
        }
    };

    if let Some(id) = query.id.as_deref().filter(|id| !id.trim().is_empty()) {
        let review = state.repo.reviews.get(id.trim()).await?;
        if user_id.as_deref().is_some_and(|u| u != review.user_id) {
            return Err(AppError::Forbidden(messages::FORBIDDEN.to_string()));
        }
        return Ok(Json(review).into_response());
    }

    let period = query.period.as_deref().filter(|s| !s.is_empty());
    let reviews = state
        .repo
        .reviews
        .list(|r| {
            user_id.as_deref().map(|u| r.user_id == u).unwrap_or(true)
                && period.map(|p| r.period == p).unwrap_or(true)
        })
        .await?;
    Ok(Json(reviews).into_response())
}

/// POST /api/employees/performance - Create a review; a body `id` upserts.
pub async fn create_review(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    ApiJson(payload): ApiJson<ReviewPayload>,
) -> ApiResult<impl IntoResponse> {
    let (review, outcome) = state.repo.save_review(None, &payload, &claims).await?;
    Ok(saved(review, outcome))
}

/// PUT /api/employees/performance/{id}
pub async fn update_review(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<ReviewPayload>,
) -> ApiResult<impl IntoResponse> {
    let (review, outcome) = state
        .repo
        .save_review(Some(&id), &payload, &claims)
        .await?;
    Ok(saved(review, outcome))
}

/// DELETE /api/employees/performance/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<PerformanceReview>> {
    let review = state.repo.reviews.delete(&id).await?;
    tracing::info!(review_id = %review.id, "Review deleted");
    Ok(Json(review))
}

/// DELETE /api/employees/performance?id=
pub async fn delete_review_by_query(
    state: State<AppState>,
    admin: AdminUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<PerformanceReview>> {
    delete_review(state, admin, ApiPath(query.require()?)).await
}

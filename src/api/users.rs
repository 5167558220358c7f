//! User API endpoints (admin only).

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use super::{saved, ApiJson, ApiPath, ApiQuery, ApiResult, IdQuery};
use crate::auth::AdminUser;
use crate::domain::stats::user_stats;
use crate::errors::AppError;
use crate::models::{Role, User, UserPayload, UserQuery, UserStats, UserView};
use crate::AppState;

/// Apply `?role=` and `?active=` to a user list.
pub(crate) fn filter_users(users: Vec<User>, query: &UserQuery) -> Result<Vec<User>, AppError> {
    let role = match query.role.as_deref().filter(|r| !r.trim().is_empty()) {
        None => None,
        Some(raw) => Some(Role::parse(raw).ok_or_else(|| {
            AppError::validation(vec!["role: perfil deve ser admin ou agent".to_string()])
        })?),
    };

    Ok(users
        .into_iter()
        .filter(|u| role.map(|r| u.role == r).unwrap_or(true))
        .filter(|u| query.active.map(|a| u.active == a).unwrap_or(true))
        .collect())
}

/// GET /api/users - List users, newest first. `?id=` returns one user.
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Response> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.trim().is_empty()) {
        let user = state.repo.users.get(id.trim()).await?;
        return Ok(Json(UserView::from(user)).into_response());
    }

    let users = state.repo.users.list(|_| true).await?;
    let views: Vec<UserView> = filter_users(users, &query)?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(Json(views).into_response())
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.repo.users.get(&id).await?.into()))
}

/// POST /api/users - Create a user; a body `id` upserts.
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(payload): ApiJson<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    let (user, outcome) = state.repo.save_user(None, &payload, Role::Agent).await?;
    Ok(saved(UserView::from(user), outcome))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    let (user, outcome) = state
        .repo
        .save_user(Some(&id), &payload, Role::Agent)
        .await?;
    Ok(saved(UserView::from(user), outcome))
}

/// DELETE /api/users/{id} - Deactivate a user.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<UserView>> {
    let user = state.repo.deactivate_user(&id).await?;
    tracing::info!(user_id = %user.id, admin_id = %claims.id, "User deactivated by admin");
    Ok(Json(user.into()))
}

/// DELETE /api/users?id=
pub async fn delete_user_by_query(
    state: State<AppState>,
    admin: AdminUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<UserView>> {
    delete_user(state, admin, ApiPath(query.require()?)).await
}

/// GET /api/users/stats
pub async fn get_user_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> ApiResult<Json<UserStats>> {
    let users = state.repo.users.all().await?;
    let reviews = state.repo.reviews.all().await?;
    let promos = state.repo.promos.all().await?;
    Ok(Json(user_stats(&users, &reviews, &promos)))
}

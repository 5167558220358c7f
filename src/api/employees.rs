//! Employee API endpoints (admin only).
//!
//! Employees are users viewed with their review digest; writes go through the
//! same user rules with `agent` as the default role.

use axum::{extract::State, response::IntoResponse, Json};

use super::users::filter_users;
use super::{saved, ApiJson, ApiPath, ApiQuery, ApiResult, IdQuery};
use crate::auth::AdminUser;
use crate::domain::stats::employee_summaries;
use crate::errors::AppError;
use crate::models::{EmployeeSummary, Role, UserPayload, UserQuery, UserView};
use crate::AppState;

/// GET /api/employees - Summaries sorted by name.
pub async fn list_employees(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Json<Vec<EmployeeSummary>>> {
    let users = filter_users(state.repo.users.all().await?, &query)?;
    let reviews = state.repo.reviews.all().await?;
    Ok(Json(employee_summaries(&users, &reviews)))
}

/// GET /api/employees/{id}
pub async fn get_employee(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<EmployeeSummary>> {
    let user = state.repo.users.get(&id).await?;
    let reviews = state.repo.reviews.all().await?;
    employee_summaries(std::slice::from_ref(&user), &reviews)
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal(format!("No summary built for {}", id)))
}

/// POST /api/employees
pub async fn create_employee(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(payload): ApiJson<UserPayload>,
) -> ApiResult<impl IntoResponse> {
    let (user, outcome) = state.repo.save_user(None, &payload, Role::Agent).await?;
    Ok(saved(UserView::from(user), outcome))
}

/// PUT /api/employees/{id}
pub async fn update_employee(
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

/// DELETE /api/employees/{id} - Deactivate.
pub async fn delete_employee(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.repo.deactivate_user(&id).await?.into()))
}

/// DELETE /api/employees?id=
pub async fn delete_employee_by_query(
    state: State<AppState>,
    admin: AdminUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<UserView>> {
    delete_employee(state, admin, ApiPath(query.require()?)).await
}

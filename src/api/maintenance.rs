//! Store bootstrap and repair endpoints.

use axum::{extract::State, Json};

use super::ApiResult;
use crate::auth::AdminUser;
use crate::models::{InitReport, MigrationReport};
use crate::AppState;

/// GET /api/init - Public so a fresh install can seed its first admin.
pub async fn init_store(State(state): State<AppState>) -> ApiResult<Json<InitReport>> {
    Ok(Json(state.repo.init(&state.config.admin).await?))
}

/// POST /api/migrate
pub async fn migrate_store(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
) -> ApiResult<Json<MigrationReport>> {
    tracing::info!(admin_id = %claims.id, "Migration requested");
    Ok(Json(state.repo.migrate().await?))
}

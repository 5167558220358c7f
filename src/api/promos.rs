//! Promo API endpoints.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};

use super::{saved, ApiJson, ApiPath, ApiQuery, ApiResult, IdQuery};
use crate::auth::AuthUser;
use crate::db::PromoFilter;
use crate::domain::dates::{days_window, local_date, parse_date, start_of_day, Window};
use crate::domain::export::{export_window, promos_to_csv};
use crate::domain::stats::promo_stats;
use crate::errors::AppError;
use crate::models::{ExportQuery, Promo, PromoPayload, PromoQuery, PromoStats};
use crate::AppState;

/// Creation-time window from optional `startDate`/`endDate` bounds.
fn created_window(query: &PromoQuery, offset: FixedOffset) -> Result<Option<Window>, AppError> {
    let parse = |raw: &Option<String>, field: &str| -> Result<_, AppError> {
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => parse_date(s).map(Some).ok_or_else(|| {
                AppError::validation(vec![format!("{}: data inválida, use AAAA-MM-DD", field)])
            }),
        }
    };

    let start = parse(&query.start_date, "startDate")?;
    let end = parse(&query.end_date, "endDate")?;

    Ok(match (start, end) {
        (None, None) => None,
        (Some(first), Some(last)) => Some(days_window(first, last, offset)?),
        (Some(first), None) => Some(Window {
            start: start_of_day(first, offset),
            end: DateTime::<Utc>::MAX_UTC,
        }),
        (None, Some(last)) => Some(Window {
            start: DateTime::<Utc>::MIN_UTC,
            end: days_window(last, last, offset)?.end,
        }),
    })
}

/// GET /api/promos - List promos, newest first. `?id=` returns one promo.
pub async fn list_promos(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiQuery(query): ApiQuery<PromoQuery>,
) -> ApiResult<Response> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.trim().is_empty()) {
        let promo = state.repo.promos.get(id.trim()).await?;
        return Ok(Json(promo).into_response());
    }

    let filter = PromoFilter {
        created: created_window(&query, state.config.utc_offset())?,
        created_by: query.created_by.clone().filter(|s| !s.is_empty()),
    };
    let promos = state.repo.list_promos(&filter).await?;
    Ok(Json(promos).into_response())
}

/// GET /api/promos/{id}
pub async fn get_promo(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Promo>> {
    Ok(Json(state.repo.promos.get(&id).await?))
}

/// POST /api/promos - Create a promo; a body `id` upserts.
pub async fn create_promo(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(payload): ApiJson<PromoPayload>,
) -> ApiResult<impl IntoResponse> {
    let (promo, outcome) = state.repo.save_promo(None, &payload, &claims).await?;
    Ok(saved(promo, outcome))
}

/// PUT /api/promos/{id}
pub async fn update_promo(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<PromoPayload>,
) -> ApiResult<impl IntoResponse> {
    let (promo, outcome) = state.repo.save_promo(Some(&id), &payload, &claims).await?;
    Ok(saved(promo, outcome))
}

/// PUT /api/promos?id= - Same as the path form; falls back to the body id.
pub async fn update_promo_by_query(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(payload): ApiJson<PromoPayload>,
) -> ApiResult<impl IntoResponse> {
    let id = match query.id {
        Some(id) => Some(id),
        None => payload.id.clone(),
    };
    let id = IdQuery { id }.require()?;
    let (promo, outcome) = state.repo.save_promo(Some(&id), &payload, &claims).await?;
    Ok(saved(promo, outcome))
}

/// DELETE /api/promos/{id}
pub async fn delete_promo(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Promo>> {
    let promo = state.repo.promos.delete(&id).await?;
    tracing::info!(promo_id = %promo.id, user_id = %claims.id, "Promo deleted");
    Ok(Json(promo))
}

/// DELETE /api/promos?id=
pub async fn delete_promo_by_query(
    state: State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Promo>> {
    delete_promo(state, user, ApiPath(query.require()?)).await
}

/// GET /api/promos/stats
pub async fn get_promo_stats(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> ApiResult<Json<PromoStats>> {
    let offset = state.config.utc_offset();
    let promos = state.repo.promos.all().await?;
    let today = local_date(Utc::now(), offset);
    Ok(Json(promo_stats(&promos, today, offset)))
}

/// GET /api/promos/csv - Download promos as CSV, oldest first.
pub async fn export_promos_csv(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let offset = state.config.utc_offset();
    let now = Utc::now();

    let filter = PromoFilter {
        created: export_window(&query, now, offset)?,
        created_by: None,
    };
    let mut promos = state.repo.list_promos(&filter).await?;
    promos.reverse();

    let filename = format!(
        "promos-{}-{}.csv",
        query.scope.as_str(),
        local_date(now, offset).format("%Y-%m-%d")
    );
    tracing::info!(
        user_id = %claims.id,
        scope = query.scope.as_str(),
        rows = promos.len(),
        "Promo CSV exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        promos_to_csv(&promos, offset),
    ))
}

//! Travel Agency Back-Office Backend
//!
//! REST backend for promos, employees, performance reviews and the Instagram
//! inbox, persisted as JSON lists in a SQLite-backed key-value store.

mod api;
mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod images;
mod models;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::TokenIssuer;
use config::Config;
use db::{KvStore, Repository};
use images::ImageSearch;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub tokens: Arc<TokenIssuer>,
    pub images: Arc<ImageSearch>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = db::init_database(&config.db_path).await?;
        let repo = Arc::new(Repository::new(KvStore::new(pool)));
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.session_ttl_hours,
        ));
        let images = Arc::new(ImageSearch::new(config.images.clone())?);

        Ok(Self {
            repo,
            tokens,
            images,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging before config so its warnings are visible
    tracing_subscriber::registry()
        .with(config::log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting travel back-office backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Business day offset: UTC{:+}", config.utc_offset_hours);

    if config.images.unsplash_access_key.is_none() && config.images.pexels_api_key.is_none() {
        tracing::warn!("No image provider keys configured; image search returns placeholders");
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config).await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
///
/// Role checks live in the handlers' extractors, so public, authenticated and
/// admin routes can share paths.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Auth
        .route("/auth/login", post(api::login))
        .route("/auth/session", get(api::current_session))
        // Promos
        .route(
            "/promos",
            get(api::list_promos)
                .post(api::create_promo)
                .put(api::update_promo_by_query)
                .delete(api::delete_promo_by_query),
        )
        .route("/promos/stats", get(api::get_promo_stats))
        .route("/promos/csv", get(api::export_promos_csv))
        .route(
            "/promos/{id}",
            get(api::get_promo)
                .put(api::update_promo)
                .delete(api::delete_promo),
        )
        // Users
        .route(
            "/users",
            get(api::list_users)
                .post(api::create_user)
                .delete(api::delete_user_by_query),
        )
        .route("/users/stats", get(api::get_user_stats))
        .route(
            "/users/{id}",
            get(api::get_user)
                .put(api::update_user)
                .delete(api::delete_user),
        )
        // Employees and performance reviews
        .route(
            "/employees",
            get(api::list_employees)
                .post(api::create_employee)
                .delete(api::delete_employee_by_query),
        )
        .route(
            "/employees/performance",
            get(api::list_reviews)
                .post(api::create_review)
                .delete(api::delete_review_by_query),
        )
        .route(
            "/employees/performance/{id}",
            put(api::update_review).delete(api::delete_review),
        )
        .route(
            "/employees/{id}",
            get(api::get_employee)
                .put(api::update_employee)
                .delete(api::delete_employee),
        )
        // Social inbox
        .route(
            "/social/instagram",
            get(api::list_messages).post(api::post_message_action),
        )
        .route(
            "/social/instagram/{id}",
            delete(api::delete_message),
        )
        // Images
        .route("/images/search", get(api::search_images))
        // Maintenance
        .route("/init", get(api::init_store))
        .route("/migrate", post(api::migrate_store));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;

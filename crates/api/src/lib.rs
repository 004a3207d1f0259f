pub mod error;
mod routes;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub const SERVICE_NAME: &str = "MockBigQuery";

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: Option<SqlitePool>,
}

impl AppState {
    pub fn new(pool: Option<SqlitePool>) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> Result<&SqlitePool, ApiError> {
        self.pool.as_ref().ok_or(ApiError::Unavailable)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/healthz", get(routes::health::healthz))
        .route("/health", get(routes::health::health))
        .route("/create_table", post(routes::tables::create_table))
        .route("/insert", post(routes::tables::insert))
        .route("/query", post(routes::tables::query))
        .route(
            "/api/data-extractions",
            get(routes::extractions::list).post(routes::extractions::create),
        )
        .route(
            "/api/data-extractions/:id",
            get(routes::extractions::get).delete(routes::extractions::delete),
        )
        .route(
            "/api/data-extractions/:id/trade-ideas",
            get(routes::extractions::trade_ideas),
        )
        .route(
            "/api/trade-ideas",
            get(routes::trade_ideas::list).post(routes::trade_ideas::create),
        )
        .route("/api/trade-ideas/:id", get(routes::trade_ideas::get))
        .route("/api/analytics/top-tags", get(routes::analytics::top_tags))
        .route(
            "/api/analytics/conviction-distribution",
            get(routes::analytics::conviction_distribution),
        )
        .route("/api/dashboard", post(routes::analytics::dashboard))
        .route("/api/tags", get(routes::tags::list))
        .route("/api/tags/categories", get(routes::tags::categories))
        .route("/api/tags/by-category/:category", get(routes::tags::by_category))
        .route(
            "/api/warehouse/research-extractions",
            get(routes::warehouse::list),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

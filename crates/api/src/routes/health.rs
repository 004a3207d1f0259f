use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::{AppState, SERVICE_NAME};

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "endpoints": {
            "health": "GET /health",
            "tables": ["POST /create_table", "POST /insert", "POST /query"],
            "extractions": "/api/data-extractions",
            "trade_ideas": "/api/trade-ideas",
            "analytics": ["/api/analytics/top-tags", "/api/analytics/conviction-distribution"],
            "dashboard": "POST /api/dashboard",
            "tags": "/api/tags",
            "warehouse": "/api/warehouse/research-extractions",
        },
    }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let Some(pool) = &state.pool else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "database": "unavailable" })),
        );
    };

    match mockbq_core::storage::ping(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "disconnected", "error": e.to_string() })),
            )
        }
    }
}

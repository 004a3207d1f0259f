use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use mockbq_core::domain::pagination::{Page, Pagination};
use mockbq_core::domain::warehouse::ResearchExtraction;
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Reads the denormalized table as of its last rebuild.
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<ResearchExtraction>>, ApiError> {
    let pool = state.pool()?;
    let Query(params) = params?;
    let pagination = Pagination::new(params.limit, params.offset)?;

    Ok(Json(storage::warehouse::list(pool, pagination).await?))
}

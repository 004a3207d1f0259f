use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use mockbq_core::domain::pagination::{Page, Pagination};
use mockbq_core::domain::trade_idea::{NewTradeIdea, TradeIdea, TradeIdeaFilter};
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    data_extraction_id: Option<Uuid>,
    min_conviction: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<TradeIdea>>, ApiError> {
    let pool = state.pool()?;
    let Query(params) = params?;

    let pagination = Pagination::new(params.limit, params.offset)?;
    let filter = TradeIdeaFilter::new(params.data_extraction_id, params.min_conviction)?;

    Ok(Json(storage::trade_ideas::list(pool, &filter, pagination).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewTradeIdea>, JsonRejection>,
) -> Result<(StatusCode, Json<TradeIdea>), ApiError> {
    let pool = state.pool()?;
    let Json(payload) = payload?;
    let new = payload.validate()?;

    let created = storage::trade_ideas::insert(pool, &new).await?;
    tracing::info!(
        id = %created.id,
        data_extraction_id = %created.data_extraction_id,
        conviction = created.conviction,
        "trade idea created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TradeIdea>, ApiError> {
    let pool = state.pool()?;
    let Path(id) = id?;

    storage::trade_ideas::get(pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("trade idea", id))
}

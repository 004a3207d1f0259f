use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use mockbq_core::domain::extraction::{DataExtraction, ExtractionFilter, NewDataExtraction};
use mockbq_core::domain::pagination::{Page, Pagination};
use mockbq_core::domain::trade_idea::TradeIdea;
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Comma separated; an extraction matches when it carries any of them.
    tags: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<DataExtraction>>, ApiError> {
    let pool = state.pool()?;
    let Query(params) = params?;

    let pagination = Pagination::new(params.limit, params.offset)?;
    let filter = ExtractionFilter::new(
        ExtractionFilter::split_tags(params.tags.as_deref()),
        params.start_date,
        params.end_date,
    )?;

    let page = storage::extractions::list(pool, &filter, pagination).await?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewDataExtraction>, JsonRejection>,
) -> Result<(StatusCode, Json<DataExtraction>), ApiError> {
    let pool = state.pool()?;
    let Json(payload) = payload?;
    let new = payload.validate()?;

    let created = storage::extractions::insert(pool, &new).await?;
    tracing::info!(id = %created.id, title = %created.title, "data extraction created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DataExtraction>, ApiError> {
    let pool = state.pool()?;
    let Path(id) = id?;

    storage::extractions::get(pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("data extraction", id))
}

pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let pool = state.pool()?;
    let Path(id) = id?;

    if storage::extractions::delete(pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("data extraction", id))
    }
}

pub async fn trade_ideas(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<TradeIdea>>, ApiError> {
    let pool = state.pool()?;
    let Path(id) = id?;

    if !storage::extractions::exists(pool, id).await? {
        return Err(ApiError::not_found("data extraction", id));
    }
    let ideas = storage::trade_ideas::list_by_extraction(pool, id).await?;
    Ok(Json(ideas))
}

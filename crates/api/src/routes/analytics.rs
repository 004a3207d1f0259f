use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use mockbq_core::domain::analytics::{self, ConvictionBucket, Dashboard, DashboardQuery, TagCount};
use mockbq_core::domain::extraction::ExtractionFilter;
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TopTagsParams {
    limit: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

pub async fn top_tags(
    State(state): State<AppState>,
    params: Result<Query<TopTagsParams>, QueryRejection>,
) -> Result<Json<Vec<TagCount>>, ApiError> {
    let pool = state.pool()?;
    let Query(params) = params?;

    let limit = analytics::top_n(params.limit)?;
    let filter = ExtractionFilter::new(Vec::new(), params.start_date, params.end_date)?;

    Ok(Json(storage::analytics::top_tags(pool, &filter, limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct DistributionParams {
    data_extraction_id: Option<Uuid>,
}

pub async fn conviction_distribution(
    State(state): State<AppState>,
    params: Result<Query<DistributionParams>, QueryRejection>,
) -> Result<Json<Vec<ConvictionBucket>>, ApiError> {
    let pool = state.pool()?;
    let Query(params) = params?;

    let buckets =
        storage::analytics::conviction_distribution(pool, params.data_extraction_id).await?;
    Ok(Json(buckets))
}

pub async fn dashboard(
    State(state): State<AppState>,
    payload: Result<Json<DashboardQuery>, JsonRejection>,
) -> Result<Json<Dashboard>, ApiError> {
    let pool = state.pool()?;
    let Json(query) = payload?;
    let filter = query.into_filter()?;

    Ok(Json(storage::analytics::dashboard(pool, &filter).await?))
}

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use mockbq_core::domain::table::{
    CreateTableRequest, InsertOutcome, InsertRequest, QueryRequest, QueryResult, TableDefinition,
};
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TableCreated {
    status: &'static str,
    #[serde(flatten)]
    table: TableDefinition,
}

pub async fn create_table(
    State(state): State<AppState>,
    payload: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Result<Json<TableCreated>, ApiError> {
    let pool = state.pool()?;
    let Json(payload) = payload?;
    let definition = payload.validate()?;

    storage::tables::create_table(pool, &definition).await?;
    Ok(Json(TableCreated {
        status: "created",
        table: definition,
    }))
}

pub async fn insert(
    State(state): State<AppState>,
    payload: Result<Json<InsertRequest>, JsonRejection>,
) -> Result<Json<InsertOutcome>, ApiError> {
    let pool = state.pool()?;
    let Json(payload) = payload?;
    let request = payload.validate()?;

    Ok(Json(storage::tables::insert_rows(pool, &request).await?))
}

pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let pool = state.pool()?;
    let Json(payload) = payload?;
    let request = payload.validate()?;

    tracing::debug!(sql = %request.sql, "running query");
    Ok(Json(storage::tables::run_query(pool, &request.sql).await?))
}

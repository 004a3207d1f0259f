use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use mockbq_core::domain::tag::{Tag, TagCategory};
use mockbq_core::storage;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TagList {
    total: usize,
    items: Vec<Tag>,
}

impl From<Vec<Tag>> for TagList {
    fn from(items: Vec<Tag>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<TagList>, ApiError> {
    let pool = state.pool()?;
    Ok(Json(storage::tags::list(pool).await?.into()))
}

pub async fn by_category(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TagList>, ApiError> {
    let Path(category) = path?;
    let pool = state.pool()?;
    Ok(Json(storage::tags::list_by_category(pool, &category).await?.into()))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<TagCategory>>, ApiError> {
    let pool = state.pool()?;
    Ok(Json(storage::tags::categories(pool).await?))
}

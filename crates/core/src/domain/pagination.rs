use crate::domain::validation::ValidationErrors;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(0);

        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.push("limit", format!("must be between 1 and {MAX_LIMIT} (got {limit})"));
        }
        if offset < 0 {
            errors.push("offset", format!("must be >= 0 (got {offset})"));
        }

        errors.finish(Self { limit, offset })
    }
}

/// A bounded slice of a filtered result set. `total` counts every matching row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: i64, pagination: Pagination, items: Vec<T>) -> Self {
        Self {
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            items,
        }
    }
}

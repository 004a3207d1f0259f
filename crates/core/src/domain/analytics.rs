use crate::domain::extraction::{DataExtraction, ExtractionFilter};
use crate::domain::trade_idea::CONVICTION_RANGE;
use crate::domain::validation::ValidationErrors;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_TAGS: i64 = 5;
pub const MAX_TOP_TAGS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvictionBucket {
    pub conviction: i32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelValue {
    pub label: String,
    pub value: i64,
}

pub fn top_n(limit: Option<i64>) -> Result<i64, ValidationErrors> {
    let limit = limit.unwrap_or(DEFAULT_TOP_TAGS);
    if !(1..=MAX_TOP_TAGS).contains(&limit) {
        return Err(ValidationErrors::single(
            "limit",
            format!("must be between 1 and {MAX_TOP_TAGS} (got {limit})"),
        ));
    }
    Ok(limit)
}

/// Expands sparse `(conviction, count)` rows into one bucket per conviction level.
pub fn fill_conviction_buckets(rows: &[(i32, i64)]) -> Vec<ConvictionBucket> {
    CONVICTION_RANGE
        .map(|conviction| ConvictionBucket {
            conviction,
            count: rows
                .iter()
                .filter(|(c, _)| *c == conviction)
                .map(|(_, n)| *n)
                .sum(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub tags: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DashboardQuery {
    pub fn into_filter(self) -> Result<ExtractionFilter, ValidationErrors> {
        ExtractionFilter::new(self.tags, self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_extractions: i64,
    pub total_trade_ideas: i64,
    pub date_range: DateRange,
    pub tags_filter: Vec<String>,
    pub popular_tags: Vec<TagCount>,
    pub by_country: Vec<LabelValue>,
    pub by_sector: Vec<LabelValue>,
    pub results: Vec<DataExtraction>,
}

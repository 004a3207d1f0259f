use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EXPORT_FORMAT_VERSION: &str = "1";

/// Denormalized warehouse row: an extraction with its trade ideas embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchExtraction {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub authors: Vec<String>,
    pub trade_ideas: Vec<EmbeddedTradeIdea>,
    pub trade_idea_count: i64,
    pub max_conviction: Option<i32>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedTradeIdea {
    pub id: Uuid,
    pub recommendation: String,
    pub summary: String,
    pub conviction: i32,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDump {
    pub exported_at: DateTime<Utc>,
    pub version: String,
    pub total: usize,
    pub extractions: Vec<ResearchExtraction>,
}

impl ExportDump {
    pub fn new(extractions: Vec<ResearchExtraction>) -> Self {
        Self {
            exported_at: Utc::now(),
            version: EXPORT_FORMAT_VERSION.to_string(),
            total: extractions.len(),
            extractions,
        }
    }
}

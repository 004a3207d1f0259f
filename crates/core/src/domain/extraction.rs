use crate::domain::validation::{required_text, text_list, ValidationErrors};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataExtraction {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub authors: Vec<String>,
}

/// Create payload. The identifier is always assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataExtraction {
    pub title: String,
    pub summary: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl NewDataExtraction {
    /// Normalizes whitespace and checks field constraints.
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required_text(&mut errors, "title", self.title, Some(TITLE_MAX_CHARS));
        let summary = required_text(&mut errors, "summary", self.summary, None);
        let tags = text_list(&mut errors, "tags", self.tags);
        let pros = text_list(&mut errors, "pros", self.pros);
        let cons = text_list(&mut errors, "cons", self.cons);
        let authors = text_list(&mut errors, "authors", self.authors);

        errors.finish(Self {
            title,
            summary,
            date: self.date,
            tags,
            pros,
            cons,
            authors,
        })
    }
}

/// Tag membership uses OR logic; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionFilter {
    pub tags: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ExtractionFilter {
    pub fn new(
        tags: Vec<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                errors.push("start_date", format!("must not be after end_date ({start} > {end})"));
            }
        }

        let tags = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        errors.finish(Self {
            tags,
            start_date,
            end_date,
        })
    }

    /// Parses the comma-separated form used in query strings (`tags=a,b`).
    pub fn split_tags(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

use crate::domain::validation::{required_text, text_list, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

pub const CONVICTION_RANGE: RangeInclusive<i32> = 1..=10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIdea {
    pub id: Uuid,
    pub data_extraction_id: Uuid,
    pub recommendation: String,
    pub summary: String,
    pub conviction: i32,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTradeIdea {
    pub data_extraction_id: Uuid,
    pub recommendation: String,
    pub summary: String,
    pub conviction: i32,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

impl NewTradeIdea {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let recommendation = required_text(&mut errors, "recommendation", self.recommendation, None);
        let summary = required_text(&mut errors, "summary", self.summary, None);
        check_conviction(&mut errors, "conviction", self.conviction);
        let pros = text_list(&mut errors, "pros", self.pros);
        let cons = text_list(&mut errors, "cons", self.cons);

        errors.finish(Self {
            data_extraction_id: self.data_extraction_id,
            recommendation,
            summary,
            conviction: self.conviction,
            pros,
            cons,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeIdeaFilter {
    pub data_extraction_id: Option<Uuid>,
    pub min_conviction: Option<i32>,
}

impl TradeIdeaFilter {
    pub fn new(
        data_extraction_id: Option<Uuid>,
        min_conviction: Option<i32>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(min) = min_conviction {
            check_conviction(&mut errors, "min_conviction", min);
        }
        errors.finish(Self {
            data_extraction_id,
            min_conviction,
        })
    }
}

fn check_conviction(errors: &mut ValidationErrors, field: &str, value: i32) {
    if !CONVICTION_RANGE.contains(&value) {
        errors.push(
            field,
            format!(
                "must be between {} and {} (got {value})",
                CONVICTION_RANGE.start(),
                CONVICTION_RANGE.end()
            ),
        );
    }
}

pub mod analytics;
pub mod extractions;
pub mod health;
pub mod tables;
pub mod tags;
pub mod trade_ideas;
pub mod warehouse;

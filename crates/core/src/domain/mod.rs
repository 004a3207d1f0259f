pub mod analytics;
pub mod extraction;
pub mod pagination;
pub mod table;
pub mod tag;
pub mod trade_idea;
pub mod validation;
pub mod warehouse;

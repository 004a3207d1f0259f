use crate::error::Result;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub data_extractions: u64,
    pub trade_ideas: u64,
    pub tags: u64,
    pub research_extractions: u64,
}

/// Empties every table. The schema and migration history are kept.
pub async fn purge(pool: &SqlitePool) -> Result<PurgeReport> {
    let mut tx = pool.begin().await?;

    let research_extractions = sqlx::query("DELETE FROM research_extractions")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    // Children first so the count is not folded into the cascade.
    let trade_ideas = sqlx::query("DELETE FROM trade_ideas")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let data_extractions = sqlx::query("DELETE FROM data_extraction_responses")
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let tags = sqlx::query("DELETE FROM tags")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    let report = PurgeReport {
        data_extractions,
        trade_ideas,
        tags,
        research_extractions,
    };
    tracing::info!(?report, "database purged");
    Ok(report)
}

use crate::domain::pagination::{Page, Pagination};
use crate::domain::warehouse::{EmbeddedTradeIdea, ResearchExtraction};
use crate::error::{Result, StoreError};
use crate::storage::parse_uuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::SqlitePool;

#[derive(Debug, sqlx::FromRow)]
struct ResearchExtractionRow {
    id: String,
    title: String,
    summary: String,
    date: NaiveDate,
    tags: Json<Vec<String>>,
    pros: Json<Vec<String>>,
    cons: Json<Vec<String>>,
    authors: Json<Vec<String>>,
    trade_ideas: Json<Vec<EmbeddedRow>>,
    trade_idea_count: i64,
    max_conviction: Option<i32>,
    refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedRow {
    id: String,
    recommendation: String,
    summary: String,
    conviction: i32,
    pros: Vec<String>,
    cons: Vec<String>,
}

impl TryFrom<ResearchExtractionRow> for ResearchExtraction {
    type Error = StoreError;

    fn try_from(row: ResearchExtractionRow) -> Result<Self> {
        let mut trade_ideas = row
            .trade_ideas
            .0
            .into_iter()
            .map(|t| {
                Ok(EmbeddedTradeIdea {
                    id: parse_uuid("research_extractions.trade_ideas[].id", &t.id)?,
                    recommendation: t.recommendation,
                    summary: t.summary,
                    conviction: t.conviction,
                    pros: t.pros,
                    cons: t.cons,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        // json_group_array has no defined order.
        trade_ideas.sort_by(|a, b| {
            b.conviction
                .cmp(&a.conviction)
                .then_with(|| a.recommendation.cmp(&b.recommendation))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(Self {
            id: parse_uuid("research_extractions.id", &row.id)?,
            title: row.title,
            summary: row.summary,
            date: row.date,
            tags: row.tags.0,
            pros: row.pros.0,
            cons: row.cons.0,
            authors: row.authors.0,
            trade_ideas,
            trade_idea_count: row.trade_idea_count,
            max_conviction: row.max_conviction,
            refreshed_at: row.refreshed_at,
        })
    }
}

/// Rebuilds `research_extractions` from the normalized tables in one transaction.
/// Returns the number of rows written.
pub async fn rebuild(pool: &SqlitePool) -> Result<u64> {
    let refreshed_at = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM research_extractions")
        .execute(&mut *tx)
        .await?;

    let written = sqlx::query(
        "INSERT INTO research_extractions \
           (id, title, summary, date, tags, pros, cons, authors, \
            trade_ideas, trade_idea_count, max_conviction, refreshed_at) \
         SELECT de.id, de.title, de.summary, de.date, de.tags, de.pros, de.cons, de.authors, \
           (SELECT json_group_array(json_object( \
                'id', ti.id, \
                'recommendation', ti.recommendation, \
                'summary', ti.summary, \
                'conviction', ti.conviction, \
                'pros', json(ti.pros), \
                'cons', json(ti.cons))) \
            FROM trade_ideas ti WHERE ti.data_extraction_id = de.id), \
           (SELECT COUNT(*) FROM trade_ideas ti WHERE ti.data_extraction_id = de.id), \
           (SELECT MAX(ti.conviction) FROM trade_ideas ti WHERE ti.data_extraction_id = de.id), \
           ? \
         FROM data_extraction_responses de",
    )
    .bind(refreshed_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(rows = written, %refreshed_at, "research_extractions rebuilt");
    Ok(written)
}

const SELECT_ROWS: &str = "SELECT id, title, summary, date, tags, pros, cons, authors, \
     trade_ideas, trade_idea_count, max_conviction, refreshed_at \
     FROM research_extractions \
     ORDER BY date DESC, title ASC, id ASC";

pub async fn list(pool: &SqlitePool, pagination: Pagination) -> Result<Page<ResearchExtraction>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM research_extractions")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, ResearchExtractionRow>(&format!("{SELECT_ROWS} LIMIT ? OFFSET ?"))
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(ResearchExtraction::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(total, pagination, items))
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ResearchExtraction>> {
    sqlx::query_as::<_, ResearchExtractionRow>(SELECT_ROWS)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(ResearchExtraction::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::extractions;
    use crate::storage::test_support::{date, extraction, pool, trade_idea};

    #[tokio::test]
    async fn rebuild_embeds_trade_ideas() {
        let pool = pool().await;
        let a = extraction(&pool, "A", date(2025, 7, 1), &["rates"]).await;
        let b = extraction(&pool, "B", date(2025, 7, 2), &[]).await;
        let low = trade_idea(&pool, a.id, 3).await;
        let high = trade_idea(&pool, a.id, 9).await;

        assert_eq!(rebuild(&pool).await.unwrap(), 2);

        let rows = list_all(&pool).await.unwrap();
        assert_eq!(rows.len(), 2);

        let row_b = &rows[0];
        assert_eq!(row_b.id, b.id);
        assert!(row_b.trade_ideas.is_empty());
        assert_eq!(row_b.trade_idea_count, 0);
        assert_eq!(row_b.max_conviction, None);

        let row_a = &rows[1];
        assert_eq!(row_a.id, a.id);
        assert_eq!(row_a.tags, vec!["rates".to_string()]);
        assert_eq!(row_a.trade_idea_count, 2);
        assert_eq!(row_a.max_conviction, Some(9));
        let ids: Vec<_> = row_a.trade_ideas.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![high.id, low.id]);
        assert_eq!(row_a.trade_ideas[1].cons, low.cons);
    }

    #[tokio::test]
    async fn rebuild_drops_deleted_extractions() {
        let pool = pool().await;
        let a = extraction(&pool, "A", date(2025, 7, 1), &[]).await;
        extraction(&pool, "B", date(2025, 7, 2), &[]).await;
        rebuild(&pool).await.unwrap();

        extractions::delete(&pool, a.id).await.unwrap();
        assert_eq!(rebuild(&pool).await.unwrap(), 1);

        let page = list(&pool, Pagination { limit: 10, offset: 0 }).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "B");
    }
}

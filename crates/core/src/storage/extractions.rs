use crate::domain::extraction::{DataExtraction, ExtractionFilter, NewDataExtraction};
use crate::domain::pagination::{Page, Pagination};
use crate::error::{Result, StoreError};
use crate::storage::parse_uuid;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

pub(crate) const COLUMNS: &str =
    "de.id, de.title, de.summary, de.date, de.tags, de.pros, de.cons, de.authors";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExtractionRow {
    id: String,
    title: String,
    summary: String,
    date: NaiveDate,
    tags: Json<Vec<String>>,
    pros: Json<Vec<String>>,
    cons: Json<Vec<String>>,
    authors: Json<Vec<String>>,
}

impl TryFrom<ExtractionRow> for DataExtraction {
    type Error = StoreError;

    fn try_from(row: ExtractionRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid("data_extraction_responses.id", &row.id)?,
            title: row.title,
            summary: row.summary,
            date: row.date,
            tags: row.tags.0,
            pros: row.pros.0,
            cons: row.cons.0,
            authors: row.authors.0,
        })
    }
}

/// Appends a WHERE clause over the `de` alias. Every value is bound, never interpolated.
pub(crate) fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ExtractionFilter) {
    qb.push(" WHERE 1 = 1");

    if !filter.tags.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(de.tags) AS ft WHERE ft.value IN (");
        {
            let mut values = qb.separated(", ");
            for tag in &filter.tags {
                values.push_bind(tag.clone());
            }
        }
        qb.push("))");
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND de.date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND de.date <= ").push_bind(end);
    }
}

/// Takes any executor so callers can insert inside their own transaction.
pub async fn insert<'e, E>(executor: E, new: &NewDataExtraction) -> Result<DataExtraction>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ExtractionRow>(
        "INSERT INTO data_extraction_responses (id, title, summary, date, tags, pros, cons, authors) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         RETURNING id, title, summary, date, tags, pros, cons, authors",
    )
    .bind(id.to_string())
    .bind(&new.title)
    .bind(&new.summary)
    .bind(new.date)
    .bind(Json(&new.tags))
    .bind(Json(&new.pros))
    .bind(Json(&new.cons))
    .bind(Json(&new.authors))
    .fetch_one(executor)
    .await?;

    let extraction = DataExtraction::try_from(row)?;
    tracing::debug!(id = %extraction.id, date = %extraction.date, "inserted data extraction");
    Ok(extraction)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<DataExtraction>> {
    let row = sqlx::query_as::<_, ExtractionRow>(&format!(
        "SELECT {COLUMNS} FROM data_extraction_responses de WHERE de.id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(DataExtraction::try_from).transpose()
}

pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM data_extraction_responses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Newest first, then by title.
pub async fn list(
    pool: &SqlitePool,
    filter: &ExtractionFilter,
    pagination: Pagination,
) -> Result<Page<DataExtraction>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM data_extraction_responses de");
    push_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS} FROM data_extraction_responses de"
    ));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY de.date DESC, de.title ASC, de.id ASC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let rows = qb.build_query_as::<ExtractionRow>().fetch_all(pool).await?;
    let items = rows
        .into_iter()
        .map(DataExtraction::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(total, pagination, items))
}

/// Unpaginated variant used by the dashboard.
pub async fn list_matching(pool: &SqlitePool, filter: &ExtractionFilter) -> Result<Vec<DataExtraction>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {COLUMNS} FROM data_extraction_responses de"
    ));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY de.date DESC, de.title ASC, de.id ASC");

    qb.build_query_as::<ExtractionRow>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(DataExtraction::try_from)
        .collect()
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM data_extraction_responses")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Deletes the extraction; the engine cascades the delete to its trade ideas.
/// Returns `false` when no row had that id.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM data_extraction_responses WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    let deleted = res.rows_affected() > 0;
    if deleted {
        tracing::info!(%id, "deleted data extraction and its trade ideas");
    }
    Ok(deleted)
}

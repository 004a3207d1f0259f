use crate::domain::pagination::{Page, Pagination};
use crate::domain::trade_idea::{NewTradeIdea, TradeIdea, TradeIdeaFilter};
use crate::error::{Result, StoreError};
use crate::storage::parse_uuid;
use sqlx::types::Json;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

const COLUMNS: &str =
    "ti.id, ti.data_extraction_id, ti.recommendation, ti.summary, ti.conviction, ti.pros, ti.cons";

#[derive(Debug, sqlx::FromRow)]
struct TradeIdeaRow {
    id: String,
    data_extraction_id: String,
    recommendation: String,
    summary: String,
    conviction: i32,
    pros: Json<Vec<String>>,
    cons: Json<Vec<String>>,
}

impl TryFrom<TradeIdeaRow> for TradeIdea {
    type Error = StoreError;

    fn try_from(row: TradeIdeaRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid("trade_ideas.id", &row.id)?,
            data_extraction_id: parse_uuid("trade_ideas.data_extraction_id", &row.data_extraction_id)?,
            recommendation: row.recommendation,
            summary: row.summary,
            conviction: row.conviction,
            pros: row.pros.0,
            cons: row.cons.0,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TradeIdeaFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(parent) = filter.data_extraction_id {
        qb.push(" AND ti.data_extraction_id = ")
            .push_bind(parent.to_string());
    }
    if let Some(min) = filter.min_conviction {
        qb.push(" AND ti.conviction >= ").push_bind(min);
    }
}

/// Referential integrity and the conviction range are enforced by the engine; violations come
/// back as `ForeignKeyViolation` / `CheckViolation`.
pub async fn insert<'e, E>(executor: E, new: &NewTradeIdea) -> Result<TradeIdea>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();

    let row = sqlx::query_as::<_, TradeIdeaRow>(
        "INSERT INTO trade_ideas (id, data_extraction_id, recommendation, summary, conviction, pros, cons) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         RETURNING id, data_extraction_id, recommendation, summary, conviction, pros, cons",
    )
    .bind(id.to_string())
    .bind(new.data_extraction_id.to_string())
    .bind(&new.recommendation)
    .bind(&new.summary)
    .bind(new.conviction)
    .bind(Json(&new.pros))
    .bind(Json(&new.cons))
    .fetch_one(executor)
    .await
    .map_err(|e| match StoreError::from(e) {
        StoreError::ForeignKeyViolation(_) => StoreError::ForeignKeyViolation(format!(
            "data extraction {} does not exist",
            new.data_extraction_id
        )),
        other => other,
    })?;

    let idea = TradeIdea::try_from(row)?;
    tracing::debug!(
        id = %idea.id,
        data_extraction_id = %idea.data_extraction_id,
        conviction = idea.conviction,
        "inserted trade idea"
    );
    Ok(idea)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<TradeIdea>> {
    let row = sqlx::query_as::<_, TradeIdeaRow>(&format!(
        "SELECT {COLUMNS} FROM trade_ideas ti WHERE ti.id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(TradeIdea::try_from).transpose()
}

/// Highest conviction first.
pub async fn list(
    pool: &SqlitePool,
    filter: &TradeIdeaFilter,
    pagination: Pagination,
) -> Result<Page<TradeIdea>> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM trade_ideas ti");
    push_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM trade_ideas ti"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY ti.conviction DESC, ti.recommendation ASC, ti.id ASC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset);

    let items = qb
        .build_query_as::<TradeIdeaRow>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(TradeIdea::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(total, pagination, items))
}

pub async fn list_by_extraction(pool: &SqlitePool, data_extraction_id: Uuid) -> Result<Vec<TradeIdea>> {
    sqlx::query_as::<_, TradeIdeaRow>(&format!(
        "SELECT {COLUMNS} FROM trade_ideas ti \
         WHERE ti.data_extraction_id = ? \
         ORDER BY ti.conviction DESC, ti.recommendation ASC, ti.id ASC"
    ))
    .bind(data_extraction_id.to_string())
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(TradeIdea::try_from)
    .collect()
}

use crate::domain::analytics::{
    fill_conviction_buckets, ConvictionBucket, Dashboard, DateRange, LabelValue, TagCount,
    DEFAULT_TOP_TAGS,
};
use crate::domain::extraction::ExtractionFilter;
use crate::domain::tag::{COUNTRY_CATEGORY, SECTOR_CATEGORY};
use crate::error::Result;
use crate::storage::extractions::{self, push_filter};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

/// Most frequent tags across the extractions matching `filter`. Each extraction counts once
/// per tag.
pub async fn top_tags(
    pool: &SqlitePool,
    filter: &ExtractionFilter,
    limit: i64,
) -> Result<Vec<TagCount>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT je.value AS tag, COUNT(DISTINCT de.id) AS count \
         FROM data_extraction_responses de, json_each(de.tags) AS je",
    );
    push_filter(&mut qb, filter);
    qb.push(" GROUP BY je.value ORDER BY 2 DESC, 1 ASC LIMIT ")
        .push_bind(limit);

    let rows = qb.build_query_as::<TagCount>().fetch_all(pool).await?;
    Ok(rows)
}

/// One bucket per conviction level, zero-filled.
pub async fn conviction_distribution(
    pool: &SqlitePool,
    data_extraction_id: Option<Uuid>,
) -> Result<Vec<ConvictionBucket>> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT conviction, COUNT(*) FROM trade_ideas");
    if let Some(id) = data_extraction_id {
        qb.push(" WHERE data_extraction_id = ").push_bind(id.to_string());
    }
    qb.push(" GROUP BY conviction");

    let rows: Vec<(i32, i64)> = qb.build_query_as().fetch_all(pool).await?;
    Ok(fill_conviction_buckets(&rows))
}

/// Extraction counts per catalog tag of `category`, joining extraction tags against the
/// tag catalog by name.
pub async fn counts_by_category(
    pool: &SqlitePool,
    filter: &ExtractionFilter,
    category: &str,
) -> Result<Vec<LabelValue>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT t.name AS label, COUNT(DISTINCT de.id) AS value \
         FROM data_extraction_responses de \
         JOIN json_each(de.tags) AS je \
         JOIN tags t ON t.name = je.value",
    );
    push_filter(&mut qb, filter);
    qb.push(" AND t.category = ")
        .push_bind(category.to_string())
        .push(" GROUP BY t.name ORDER BY 2 DESC, 1 ASC");

    let rows = qb.build_query_as::<LabelValue>().fetch_all(pool).await?;
    Ok(rows)
}

pub async fn trade_idea_count(pool: &SqlitePool, filter: &ExtractionFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM trade_ideas ti \
         JOIN data_extraction_responses de ON de.id = ti.data_extraction_id",
    );
    push_filter(&mut qb, filter);
    let n: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(n)
}

pub async fn dashboard(pool: &SqlitePool, filter: &ExtractionFilter) -> Result<Dashboard> {
    let results = extractions::list_matching(pool, filter).await?;
    let total_trade_ideas = trade_idea_count(pool, filter).await?;
    let popular_tags = top_tags(pool, filter, DEFAULT_TOP_TAGS).await?;
    let by_country = counts_by_category(pool, filter, COUNTRY_CATEGORY).await?;
    let by_sector = counts_by_category(pool, filter, SECTOR_CATEGORY).await?;

    tracing::debug!(
        tags = ?filter.tags,
        start_date = ?filter.start_date,
        end_date = ?filter.end_date,
        extractions = results.len(),
        trade_ideas = total_trade_ideas,
        "dashboard computed"
    );

    Ok(Dashboard {
        total_extractions: results.len() as i64,
        total_trade_ideas,
        date_range: DateRange {
            start: filter.start_date,
            end: filter.end_date,
        },
        tags_filter: filter.tags.clone(),
        popular_tags,
        by_country,
        by_sector,
        results,
    })
}

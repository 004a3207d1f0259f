use crate::domain::tag::{plan_catalog, SkippedTag, Tag, TagCatalog, TagCategory};
use crate::error::Result;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLoad {
    pub inserted: u64,
    pub replaced: u64,
    pub skipped: Vec<SkippedTag>,
}

/// Replaces the whole catalog in one transaction.
pub async fn load_catalog(pool: &SqlitePool, catalog: &TagCatalog) -> Result<CatalogLoad> {
    let plan = plan_catalog(catalog);

    let mut tx = pool.begin().await?;

    let replaced = sqlx::query("DELETE FROM tags")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut inserted: u64 = 0;
    for (name, category) in &plan.entries {
        inserted += sqlx::query("INSERT INTO tags (name, category) VALUES (?, ?)")
            .bind(name)
            .bind(category)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;

    for skipped in &plan.skipped {
        tracing::warn!(
            name = %skipped.name,
            category = %skipped.category,
            kept_in = %skipped.kept_in,
            "duplicate tag name skipped"
        );
    }
    tracing::info!(inserted, replaced, skipped = plan.skipped.len(), "tag catalog loaded");

    Ok(CatalogLoad {
        inserted,
        replaced,
        skipped: plan.skipped,
    })
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT id, name, category FROM tags ORDER BY category ASC, name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

pub async fn list_by_category(pool: &SqlitePool, category: &str) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT id, name, category FROM tags WHERE category = ? ORDER BY name ASC",
    )
    .bind(category)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

pub async fn categories(pool: &SqlitePool) -> Result<Vec<TagCategory>> {
    let rows = sqlx::query_as::<_, TagCategory>(
        "SELECT category, COUNT(*) AS tag_count FROM tags GROUP BY category ORDER BY category ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

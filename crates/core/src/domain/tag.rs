use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const COUNTRY_CATEGORY: &str = "country";
pub const SECTOR_CATEGORY: &str = "sector";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCategory {
    pub category: String,
    pub tag_count: i64,
}

/// On-disk catalog format: `{ "<category>": ["<name>", ...] }`.
pub type TagCatalog = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTag {
    pub name: String,
    pub category: String,
    pub kept_in: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPlan {
    /// `(name, category)` pairs in insertion order.
    pub entries: Vec<(String, String)>,
    pub skipped: Vec<SkippedTag>,
}

/// Tag names are unique across the whole catalog. Categories are visited in key order and a
/// name seen again later is skipped.
pub fn plan_catalog(catalog: &TagCatalog) -> CatalogPlan {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut plan = CatalogPlan::default();

    for (category, names) in catalog {
        let category = category.trim();
        if category.is_empty() {
            continue;
        }
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(kept_in) = seen.get(name) {
                plan.skipped.push(SkippedTag {
                    name: name.to_string(),
                    category: category.to_string(),
                    kept_in: kept_in.clone(),
                });
                continue;
            }
            seen.insert(name.to_string(), category.to_string());
            plan.entries.push((name.to_string(), category.to_string()));
        }
    }

    plan
}

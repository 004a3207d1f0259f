use crate::domain::table::{
    has_integer_affinity, quote_ident, InsertOutcome, InsertRequest, QueryResult, TableDefinition,
};
use crate::domain::validation::ValidationErrors;
use crate::error::{Result, StoreError};
use serde_json::{Map, Number, Value};
use sqlx::query_builder::Separated;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool, TypeInfo, ValueRef};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, sqlx::FromRow)]
struct TableColumn {
    name: String,
    declared_type: String,
    pk: i64,
}

pub async fn create_table(pool: &SqlitePool, definition: &TableDefinition) -> Result<()> {
    let mut tx = pool.begin().await?;

    if table_exists(&mut tx, &definition.name).await? {
        return Err(StoreError::TableExists(definition.name.clone()));
    }
    sqlx::query(&definition.create_sql())
        .persistent(false)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        table = %definition.name,
        columns = definition.columns.len(),
        primary_key = ?definition.primary_key,
        "table created"
    );
    Ok(())
}

/// Inserts every row or none of them.
///
/// Rows without a value for an integer primary key get `max(existing, explicit in batch) + 1`,
/// in row order. Duplicate keys, either inside the batch or against stored rows, are rejected
/// before anything is written.
pub async fn insert_rows(pool: &SqlitePool, request: &InsertRequest) -> Result<InsertOutcome> {
    let mut tx = pool.begin().await?;

    let columns = table_columns(&mut tx, &request.table).await?;
    if columns.is_empty() {
        return Err(StoreError::not_found("table", &request.table));
    }
    let mut rows = align_rows(&columns, &request.data)?;

    let mut assigned_ids = Vec::new();
    if let Some(k) = single_primary_key(&columns) {
        let key = &columns[k];

        if rows.iter().any(|row| is_missing(&row[k])) {
            if !has_integer_affinity(&key.declared_type) {
                return Err(ValidationErrors::single(
                    key.name.clone(),
                    "is required because the primary key is not an integer",
                )
                .into());
            }
            let stored_max = max_key(&mut tx, &request.table, &key.name).await?;
            let explicit_max = rows
                .iter()
                .filter_map(|row| row[k].as_ref().and_then(Value::as_i64))
                .max();
            let mut next = stored_max.max(explicit_max).unwrap_or(0).saturating_add(1);

            for row in rows.iter_mut().filter(|row| is_missing(&row[k])) {
                row[k] = Some(Value::from(next));
                assigned_ids.push(next);
                next = next.saturating_add(1);
            }
        }

        let keys: Vec<&Value> = rows.iter().filter_map(|row| row[k].as_ref()).collect();
        reject_duplicate_keys(&mut tx, &request.table, &key.name, &keys).await?;
    }

    let used: Vec<usize> = (0..columns.len())
        .filter(|&i| rows.iter().any(|row| row[i].is_some()))
        .collect();
    let row_count = rows.len();

    let mut qb = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} (", quote_ident(&request.table)));
    qb.push(
        used.iter()
            .map(|&i| quote_ident(&columns[i].name))
            .collect::<Vec<_>>()
            .join(", "),
    );
    qb.push(") ");
    qb.push_values(rows, |mut b, mut row| {
        for &i in &used {
            bind_json(&mut b, row[i].take());
        }
    });
    qb.build().persistent(false).execute(&mut *tx).await?;

    tx.commit().await?;
    tracing::info!(
        table = %request.table,
        rows = row_count,
        assigned = assigned_ids.len(),
        "rows inserted"
    );

    Ok(InsertOutcome {
        table: request.table.clone(),
        rows: row_count,
        assigned_ids,
    })
}

/// Runs caller supplied SQL and returns each result row as a JSON object keyed by column name.
/// Statements that return nothing (DDL, DML) yield an empty list.
pub async fn run_query(pool: &SqlitePool, sql: &str) -> Result<QueryResult> {
    let rows = sqlx::query(sql)
        .persistent(false)
        .fetch_all(pool)
        .await
        .map_err(classify_query_error)?;

    let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;
    tracing::debug!(rows = rows.len(), "query finished");
    Ok(QueryResult { rows })
}

async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ? COLLATE NOCASE",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(found.is_some())
}

async fn table_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<TableColumn>> {
    let columns = sqlx::query_as::<_, TableColumn>(
        "SELECT name, type AS declared_type, pk FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;
    Ok(columns)
}

async fn max_key(conn: &mut SqliteConnection, table: &str, column: &str) -> Result<Option<i64>> {
    let sql = format!(
        "SELECT CAST(MAX({col}) AS INTEGER) FROM {table}",
        col = quote_ident(column),
        table = quote_ident(table)
    );
    let max: Option<i64> = sqlx::query_scalar(&sql)
        .persistent(false)
        .fetch_one(&mut *conn)
        .await?;
    Ok(max)
}

async fn reject_duplicate_keys(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    keys: &[&Value],
) -> Result<()> {
    let mut seen = HashSet::new();
    let repeated: BTreeSet<String> = keys
        .iter()
        .map(|key| key_text(key))
        .filter(|text| !seen.insert(text.clone()))
        .collect();
    if !repeated.is_empty() {
        return Err(StoreError::UniqueViolation(format!(
            "duplicate primary key values in batch for {table}.{column}: {}",
            repeated.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    if keys.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {col} AS key FROM {table} WHERE {col} IN (",
        col = quote_ident(column),
        table = quote_ident(table)
    ));
    {
        let mut values = qb.separated(", ");
        for key in keys {
            bind_json(&mut values, Some((*key).clone()));
        }
    }
    qb.push(")");

    let rows = qb.build().persistent(false).fetch_all(&mut *conn).await?;
    if rows.is_empty() {
        return Ok(());
    }
    let existing: BTreeSet<String> = rows
        .iter()
        .map(|row| row_to_json(row).map(|obj| obj.get("key").map(key_text).unwrap_or_default()))
        .collect::<Result<_>>()?;
    Err(StoreError::UniqueViolation(format!(
        "primary key values already exist in {table}.{column}: {}",
        existing.into_iter().collect::<Vec<_>>().join(", ")
    )))
}

/// Maps each JSON object onto the table's column order. `None` means the row did not mention
/// the column.
fn align_rows(columns: &[TableColumn], data: &[Map<String, Value>]) -> Result<Vec<Vec<Option<Value>>>> {
    let mut errors = ValidationErrors::new();
    let mut rows = Vec::with_capacity(data.len());

    for (idx, object) in data.iter().enumerate() {
        let mut row: Vec<Option<Value>> = vec![None; columns.len()];
        for (key, value) in object {
            match columns.iter().position(|c| c.name.eq_ignore_ascii_case(key)) {
                Some(i) if row[i].is_some() => {
                    errors.push(format!("data[{idx}].{key}"), "column given more than once")
                }
                Some(i) => row[i] = Some(value.clone()),
                None => errors.push(format!("data[{idx}].{key}"), "no such column"),
            }
        }
        rows.push(row);
    }

    Ok(errors.finish(rows)?)
}

fn single_primary_key(columns: &[TableColumn]) -> Option<usize> {
    let mut keys = columns.iter().enumerate().filter(|(_, c)| c.pk > 0);
    match (keys.next(), keys.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

fn is_missing(value: &Option<Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn bind_json(b: &mut Separated<'_, '_, Sqlite, &'static str>, value: Option<Value>) {
    match value {
        None | Some(Value::Null) => {
            b.push_bind(None::<String>);
        }
        Some(Value::Bool(v)) => {
            b.push_bind(v);
        }
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                b.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                b.push_bind(f);
            } else {
                b.push_bind(n.to_string());
            }
        }
        Some(Value::String(s)) => {
            b.push_bind(s);
        }
        Some(other) => {
            b.push_bind(other.to_string());
        }
    }
}

// Storage classes are per value in SQLite, so the decoded type follows the value rather than
// the declared column type.
fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for column in row.columns() {
        let i = column.ordinal();
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(i)?),
                "REAL" => Number::from_f64(row.try_get::<f64, _>(i)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "BLOB" => Value::String(String::from_utf8_lossy(&row.try_get::<Vec<u8>, _>(i)?).into_owned()),
                _ => Value::String(row.try_get::<String, _>(i)?),
            }
        };
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn classify_query_error(err: sqlx::Error) -> StoreError {
    match StoreError::from(err) {
        StoreError::Database(sqlx::Error::Database(db_err)) => {
            StoreError::InvalidQuery(db_err.message().to_string())
        }
        other => other,
    }
}

//! Ad-hoc tables created and filled through the generic warehouse endpoints.
//!
//! Table and column names cannot be bound as parameters, so every identifier is checked here
//! and then quoted before it reaches SQL. Column types are limited to words, digits and
//! parentheses (`VARCHAR`, `DECIMAL(10, 2)`).

use crate::domain::validation::{required_text, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
    /// Comma separated column definitions, e.g. `id INTEGER, name VARCHAR`.
    pub table_schema: String,
    #[serde(default)]
    pub primary_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<String>,
}

impl CreateTableRequest {
    pub fn validate(self) -> Result<TableDefinition, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required_text(&mut errors, "name", self.name, None);
        if !name.is_empty() {
            check_table_name(&mut errors, "name", &name);
        }

        let columns = parse_schema(&mut errors, &self.table_schema);

        let primary_key = self
            .primary_key
            .map(|pk| pk.trim().to_string())
            .filter(|pk| !pk.is_empty());
        if let Some(pk) = &primary_key {
            if !columns.is_empty() && !columns.iter().any(|c| c.name.eq_ignore_ascii_case(pk)) {
                errors.push("primary_key", format!("{pk:?} is not a column of the table"));
            }
        }

        errors.finish(TableDefinition {
            name,
            columns,
            primary_key,
        })
    }
}

impl TableDefinition {
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type))
            .collect();
        if let Some(pk) = &self.primary_key {
            parts.push(format!("PRIMARY KEY ({})", quote_ident(pk)));
        }
        format!("CREATE TABLE {} ({})", quote_ident(&self.name), parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertRequest {
    pub table: String,
    pub data: Vec<Map<String, Value>>,
}

impl InsertRequest {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let table = required_text(&mut errors, "table", self.table, None);
        if !table.is_empty() && !is_identifier(&table) {
            errors.push("table", "must be a plain identifier");
        }
        if self.data.is_empty() {
            errors.push("data", "must contain at least one row");
        }
        for (idx, row) in self.data.iter().enumerate() {
            if row.is_empty() {
                errors.push(format!("data[{idx}]"), "must not be empty");
            }
            for key in row.keys().filter(|k| !is_identifier(k)) {
                errors.push(format!("data[{idx}].{key}"), "is not a valid column name");
            }
        }

        errors.finish(Self {
            table,
            data: self.data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub table: String,
    pub rows: usize,
    /// Primary key values generated for rows that did not carry one.
    pub assigned_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}

impl QueryRequest {
    pub fn validate(self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let sql = required_text(&mut errors, "sql", self.sql, None);
        errors.finish(Self { sql })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Map<String, Value>>,
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Only call with names that passed [`is_identifier`].
pub fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

/// SQLite integer affinity: the declared type contains `INT`.
pub fn has_integer_affinity(sql_type: &str) -> bool {
    sql_type.to_ascii_uppercase().contains("INT")
}

fn check_table_name(errors: &mut ValidationErrors, field: &str, name: &str) {
    if !is_identifier(name) {
        errors.push(field, "must be a plain identifier");
    } else if name.to_ascii_lowercase().starts_with("sqlite_") {
        errors.push(field, "names starting with sqlite_ are reserved");
    }
}

fn parse_schema(errors: &mut ValidationErrors, schema: &str) -> Vec<ColumnDef> {
    if schema.trim().is_empty() {
        errors.push("table_schema", "must not be blank");
        return Vec::new();
    }

    let mut columns: Vec<ColumnDef> = Vec::new();
    for (idx, part) in split_top_level(schema).into_iter().enumerate() {
        let field = format!("table_schema[{idx}]");
        let part = part.trim();
        let Some((name, sql_type)) = part.split_once(char::is_whitespace) else {
            errors.push(field, format!("{part:?} needs a column name and a type"));
            continue;
        };
        let sql_type = sql_type.split_whitespace().collect::<Vec<_>>().join(" ");

        if !is_identifier(name) {
            errors.push(field, format!("{name:?} is not a valid column name"));
            continue;
        }
        if !sql_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '(' | ')' | ','))
        {
            errors.push(field, format!("unsupported column type {sql_type:?}"));
            continue;
        }
        if columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            errors.push(field, format!("duplicate column {name:?}"));
            continue;
        }
        columns.push(ColumnDef {
            name: name.to_string(),
            sql_type,
        });
    }
    columns
}

/// Splits on commas that are not inside parentheses, so `DECIMAL(10, 2)` stays whole.
fn split_top_level(schema: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in schema.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&schema[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&schema[start..]);
    parts
}

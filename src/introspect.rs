//! Schema and sample-data introspection for uploaded databases.
//!
//! One pass produces everything the prompt composer and the overview display
//! need: table names, ordered column lists, bounded distinct-value samples,
//! and a few preview rows per table. Read-only throughout.

use crate::types::{AskError, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;

/// Upper bound on distinct values sampled per column.
pub const MAX_DISTINCT_VALUES: usize = 10;

/// Preview rows shown per table in the schema overview.
pub const PREVIEW_ROWS: usize = 5;

/// Rows from the first table embedded in the generation prompt.
pub const SAMPLE_ROWS: usize = 3;

/// Table name plus ordered column list.
///
/// Column names are unique within a table. Built once per introspection pass
/// and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Up to [`MAX_DISTINCT_VALUES`] stringified distinct non-null values from one
/// column. Prompt enrichment only, never used for correctness.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnValueSample {
    pub table: String,
    pub column: String,
    pub values: Vec<String>,
}

/// A small row dump from one table.
#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Result of one introspection pass over a database.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseOverview {
    pub tables: Vec<TableSchema>,
    pub samples: Vec<ColumnValueSample>,
    pub previews: Vec<TablePreview>,
}

/// Introspect the whole database: tables, columns, value samples, previews.
///
/// A failure reading any single table or column is logged and skipped, so
/// partial success is the norm.
///
/// # Errors
///
/// Returns `AskError::EmptySource` if the database contains no user tables.
pub fn introspect(conn: &Connection) -> Result<DatabaseOverview> {
    let names = list_tables(conn)?;
    if names.is_empty() {
        return Err(AskError::EmptySource);
    }

    let mut tables = Vec::new();
    let mut samples = Vec::new();
    let mut previews = Vec::new();

    for name in &names {
        let columns = match table_columns(conn, name) {
            Ok(cols) => cols,
            Err(e) => {
                tracing::warn!(table = %name, error = %e, "skipping table, column listing failed");
                continue;
            }
        };

        for column in &columns {
            match distinct_values(conn, name, column) {
                Ok(values) if !values.is_empty() => samples.push(ColumnValueSample {
                    table: name.clone(),
                    column: column.clone(),
                    values,
                }),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(table = %name, column = %column, error = %e,
                        "skipping column, value sampling failed");
                }
            }
        }

        match preview_rows(conn, name, PREVIEW_ROWS) {
            Ok(preview) => previews.push(preview),
            Err(e) => {
                tracing::warn!(table = %name, error = %e, "skipping table preview");
            }
        }

        tables.push(TableSchema {
            name: name.clone(),
            columns,
        });
    }

    Ok(DatabaseOverview {
        tables,
        samples,
        previews,
    })
}

/// List user table names, skipping SQLite internals.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Ordered column names for one table.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get(1))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(columns)
}

/// Up to [`MAX_DISTINCT_VALUES`] distinct non-null values from one column,
/// stringified.
pub fn distinct_values(conn: &Connection, table: &str, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {} FROM {} LIMIT {}",
        quote_ident(column),
        quote_ident(table),
        MAX_DISTINCT_VALUES
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        if let Some(text) = value_to_string(row.get_ref(0)?) {
            values.push(text);
        }
    }
    Ok(values)
}

/// Up to `limit` rows from one table, all cells stringified.
pub fn preview_rows(conn: &Connection, table: &str, limit: usize) -> Result<TablePreview> {
    let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(table), limit);
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut out = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            cells.push(value_to_string(row.get_ref(i)?).unwrap_or_else(|| "NULL".to_string()));
        }
        out.push(cells);
    }

    Ok(TablePreview {
        table: table.to_string(),
        columns,
        rows: out,
    })
}

/// Double-quote an identifier for embedding in SQL text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Stringify a SQLite value. NULL maps to `None`.
pub(crate) fn value_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(format!("<blob {} bytes>", b.len())),
    }
}

//! Read-only query execution.

use crate::introspect::value_to_string;
use crate::types::Result;
use rusqlite::Connection;
use serde::Serialize;

/// A tabular query result, possibly empty. All cells are stringified.
#[derive(Debug, Clone, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Eligibility gate: only query text whose case-insensitive trimmed form
/// begins with `select` is ever executed. A coarse safety check against
/// destructive statements, not a SQL parser.
pub fn is_read_query(sql: &str) -> bool {
    sql.trim().to_lowercase().starts_with("select")
}

/// Execute a query and collect its full result set.
///
/// Callers are expected to have passed `sql` through [`is_read_query`] first;
/// this function runs whatever it is given.
///
/// # Errors
///
/// Propagates the engine error so the caller can feed its message into the
/// corrective re-prompt.
pub fn run_query(conn: &Connection, sql: &str) -> Result<ResultTable> {
    let mut stmt = conn.prepare(sql)?;
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

    Ok(ResultTable { columns, rows: out })
}

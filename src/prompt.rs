//! Prompt construction for the external generative-text service.
//!
//! Pure string templating: every function here is deterministic given its
//! inputs and has no side effects, so tests can assert on exact output.

use crate::introspect::{ColumnValueSample, DatabaseOverview, TablePreview, TableSchema, SAMPLE_ROWS};

/// Everything the generation prompt is built from. Immutable once built; one
/// instance per question.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub tables: Vec<TableSchema>,
    pub samples: Vec<ColumnValueSample>,
    /// Row dump from the first table, capped at [`SAMPLE_ROWS`].
    pub sample_rows: Option<TablePreview>,
    pub question: String,
}

impl PromptContext {
    /// Build a context from an introspection pass and a question.
    pub fn from_overview(overview: &DatabaseOverview, question: &str) -> Self {
        let sample_rows = overview.previews.first().map(|preview| {
            let mut preview = preview.clone();
            preview.rows.truncate(SAMPLE_ROWS);
            preview
        });

        Self {
            tables: overview.tables.clone(),
            samples: overview.samples.clone(),
            sample_rows,
            question: question.to_string(),
        }
    }
}

/// Render schema as one line per table:
/// `Table 'orders' has columns: id, user_id, country`
pub fn schema_text(tables: &[TableSchema]) -> String {
    tables
        .iter()
        .map(|t| format!("Table '{}' has columns: {}", t.name, t.columns.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render value samples as one line per column:
/// `orders.country = [India, USA, UK]`
pub fn sample_values_text(samples: &[ColumnValueSample]) -> String {
    samples
        .iter()
        .map(|s| format!("{}.{} = [{}]", s.table, s.column, s.values.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn sample_rows_text(preview: &TablePreview) -> String {
    let mut lines = vec![preview.columns.join(" | ")];
    for row in &preview.rows {
        lines.push(row.join(" | "));
    }
    lines.join("\n")
}

/// Build the generation prompt for one question.
pub fn compose(ctx: &PromptContext) -> String {
    let sample_data = ctx
        .sample_rows
        .as_ref()
        .map(|p| format!("Sample Data (from table '{}'):\n{}\n\n", p.table, sample_rows_text(p)))
        .unwrap_or_default();

    format!(
        "You are an intelligent SQL assistant. Convert the natural language question into a valid SQL query.\n\n\
         Schema:\n{schema}\n\n\
         Sample Values:\n{values}\n\n\
         {sample_data}\
         Natural Language Question:\n\"\"\"{question}\"\"\"\n\n\
         Rules:\n\
         1. Recognize country/region synonyms (e.g., US, USA, America = United States).\n\
         2. Handle minor spelling errors in country names.\n\
         3. Use only table and column names from the schema.\n\
         4. Return only the SQL query.\n\
         5. The SQL must be ready to run directly on the uploaded database.\n\
         6. When a question names a country, match its common variants (e.g., \"India\" covers 'india', 'IND', 'Bharat').\n\n\
         SQL Query:",
        schema = schema_text(&ctx.tables),
        values = sample_values_text(&ctx.samples),
        sample_data = sample_data,
        question = ctx.question,
    )
}

/// Build the corrective re-prompt after a failed execution: the failing query,
/// the engine error, and the schema.
pub fn correction_prompt(query: &str, error: &str, tables: &[TableSchema]) -> String {
    format!(
        "This SQL query failed with error: {error}\n\
         Query: {query}\n\
         Schema:\n{schema}\n\
         Suggest a corrected SQL version (only SQL):",
        error = error,
        query = query,
        schema = schema_text(tables),
    )
}

/// Build the optional region-handling explanation request.
pub fn explanation_prompt(question: &str, query: &str) -> String {
    format!(
        "Briefly explain how you handled regional terms in this query:\n\
         Original: \"{question}\"\n\
         SQL: \"{query}\"",
        question = question,
        query = query,
    )
}

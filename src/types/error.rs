//! Error types for askdb.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AskError>;

#[derive(Error, Debug)]
pub enum AskError {
    /// The uploaded database contains no tables. Terminal: the caller must
    /// stop and ask for a different upload.
    #[error("No tables found in database")]
    EmptySource,

    /// The external model call failed or returned an unusable response.
    #[error("Query generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Session lifecycle: one uploaded database file, one connection.

use crate::introspect::{self, DatabaseOverview};
use crate::types::{AskError, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// An open database session.
///
/// Owns the connection and the transient copy of the uploaded file. The
/// connection is the only shared mutable resource; dropping the session
/// closes it and removes the copy. One session per uploaded file; questions
/// within a session are stateless.
pub struct Session {
    conn: Connection,
    source_name: String,
    _storage: Option<TempDir>,
}

impl Session {
    /// Open a session over an uploaded database file.
    ///
    /// The file is copied into session-scoped temporary storage and the copy
    /// is opened, so queries never touch the original upload. The copy is
    /// removed when the session is dropped.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AskError::Config(format!(
                "Database file not found: {}",
                path.display()
            )));
        }

        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.db")
            .to_string();

        let storage = TempDir::new()?;
        let working_copy = storage.path().join(&source_name);
        fs::copy(path, &working_copy)?;

        let conn = Connection::open(&working_copy)?;

        Ok(Self {
            conn,
            source_name,
            _storage: Some(storage),
        })
    }

    /// Open an in-memory session, for tests and embedding.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            source_name: ":memory:".to_string(),
            _storage: None,
        })
    }

    /// File name of the uploaded source.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// The session's connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a full introspection pass over the session's database.
    ///
    /// # Errors
    ///
    /// `AskError::EmptySource` if the database contains no tables.
    pub fn overview(&self) -> Result<DatabaseOverview> {
        introspect::introspect(&self.conn)
    }
}

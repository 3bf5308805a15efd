//! Error types for the SQLite adapter

use lattice_core::BackendError;
use thiserror::Error;

/// SQLite adapter error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Metadata fetch found no such table
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Declared column type outside the adapter's mapping table
    #[error("unrecognized column type {type_name:?} on column {column}")]
    UnknownColumnType { column: String, type_name: String },

    /// Blocking task panicked or was cancelled
    #[error("task join error: {0}")]
    Join(String),

    /// Underlying rusqlite error
    #[error("sqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for BackendError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Connection(msg) => Self::Other(msg),
            SqliteError::TableNotFound(table) => Self::TableNotFound(table),
            SqliteError::UnknownColumnType { column, type_name } => {
                Self::UnknownColumnType { column, type_name }
            }
            SqliteError::Join(msg) => Self::Other(msg),
            SqliteError::Rusqlite(e) => match &e {
                // Binding-shape failures are the caller's parameters, not
                // an opaque backend fault.
                rusqlite::Error::InvalidParameterCount(..)
                | rusqlite::Error::ToSqlConversionFailure(_)
                | rusqlite::Error::InvalidColumnType(..) => Self::TypeMismatch(e.to_string()),
                _ => Self::Other(e.to_string()),
            },
        }
    }
}

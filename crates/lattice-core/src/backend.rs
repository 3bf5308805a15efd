//! The backend adapter boundary
//!
//! A [`Backend`] is the async seam a database driver implements: fetch
//! column metadata once per table, then execute compiled statements. Rows
//! cross the boundary as JSON records; errors are opaque unless the
//! adapter can recognize a parameter-type mismatch.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coerce::{SemanticType, SqlValue};
use crate::error::QueryError;

/// One fetched row, keyed by column name
pub type Record = Map<String, Value>;

/// Foreign-key edge reported by the backend's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referenced table
    pub table: String,
    /// Referenced column in that table
    pub column: String,
}

/// Per-column metadata, fetched once per table binding and immutable
/// thereafter
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub semantic: SemanticType,
    pub nullable: bool,
    pub references: Option<ForeignKey>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, semantic: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic,
            nullable: true,
            references: None,
        }
    }
}

/// Positional placeholder syntax - the one backend-specific detail the
/// compiler needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?1, ?2, ...` (SQLite)
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL)
    Dollar,
}

impl Placeholder {
    /// Render the placeholder for the 1-based parameter `index`
    pub fn format(self, index: usize) -> String {
        match self {
            Self::Question => format!("?{index}"),
            Self::Dollar => format!("${index}"),
        }
    }
}

/// A finalized statement: SQL text plus positional parameters, produced by
/// a compiler and consumed exactly once by a backend call
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// A bound parameter did not fit the column's type; surfaces to the
    /// caller as invalid params rather than an opaque failure
    #[error("parameter type mismatch: {0}")]
    TypeMismatch(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Metadata reported a type name outside the adapter's mapping table;
    /// the bind fails rather than letting values pass unconverted
    #[error("unrecognized column type {type_name:?} on column {column}")]
    UnknownColumnType { column: String, type_name: String },

    #[error("backend error: {0}")]
    Other(String),
}

impl From<BackendError> for QueryError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::TypeMismatch(msg) => Self::InvalidParams(msg),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Async adapter contract implemented per database
#[async_trait]
pub trait Backend: Send + Sync {
    /// Placeholder syntax compiled statements must use
    fn placeholder(&self) -> Placeholder;

    /// Fetch column metadata for `table`. Called once per table binding.
    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnMeta>, BackendError>;

    /// Run a write statement, returning the affected-row count. Zero is a
    /// legitimate result, not an error.
    async fn execute(&self, query: CompiledQuery) -> Result<u64, BackendError>;

    /// Fetch at most one row
    async fn fetch_one(&self, query: CompiledQuery) -> Result<Option<Record>, BackendError>;

    /// Fetch every matching row
    async fn fetch_all(&self, query: CompiledQuery) -> Result<Vec<Record>, BackendError>;
}

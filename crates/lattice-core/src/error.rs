//! Error taxonomy for the request pipeline
//!
//! Internal errors are richer than the consumer-facing [`RetCode`]; the
//! mapping collapses them at the envelope boundary. Programming-contract
//! violations are not represented here - those are assertions, not values.

use serde_json::Value;
use thiserror::Error;

use crate::retcode::{Envelope, RetCode};

/// Pipeline-internal error, collapsed to a [`RetCode`] at the boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Malformed input syntax or an uncoercible value
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Request references a column the table does not have
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Write-ability filtering left nothing to update
    #[error("no writable columns in payload")]
    NoWritableColumns,

    /// Foreign-key eager load could not be resolved
    #[error("eager load failed: {0}")]
    EagerLoad(String),

    /// Opaque backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for pipeline steps
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// The consumer-facing status this error collapses to
    pub fn retcode(&self) -> RetCode {
        match self {
            Self::InvalidParams(_) => RetCode::InvalidParams,
            Self::ColumnNotFound(_)
            | Self::NoWritableColumns
            | Self::EagerLoad(_)
            | Self::Backend(_) => RetCode::Failed,
        }
    }
}

impl From<QueryError> for Envelope {
    fn from(err: QueryError) -> Self {
        Self {
            code: err.retcode(),
            data: Value::String(err.to_string()),
        }
    }
}

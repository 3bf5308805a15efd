//! Compiler error type

use lattice_core::QueryError;
use thiserror::Error;

/// Statement compilation failure. These indicate caller bugs or schema
/// drift, not malformed user input - user syntax is rejected earlier, at
/// descriptor parse time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("no table specified")]
    MissingTable,

    #[error("no values to bind")]
    EmptyValues,

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

impl From<CompileError> for QueryError {
    fn from(err: CompileError) -> Self {
        Self::Backend(format!("statement compilation failed: {err}"))
    }
}

//! Semantic column types and value coercion
//!
//! Backend drivers report native type names (`int8`, `bytea`, `FLOAT`);
//! adapters classify those into the closed [`SemanticType`] enum at bind
//! time. Incoming wire values are always text-shaped JSON and get coerced
//! here into [`SqlValue`] parameters before compilation. Coercion never
//! defaults silently - every failure carries a reason.

use serde_json::Value;
use thiserror::Error;

use crate::descriptor::{Filter, Operator};
use crate::error::QueryError;

/// Coercion-target classification of a column, independent of the
/// backend's native type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Integer,
    Float,
    Binary,
    Text,
    Boolean,
    Json,
}

/// A coerced parameter value, ready to bind
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    Json(Value),
}

/// Value side of a coerced filter: one scalar, or one value per element of
/// an `in` sequence
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Single(SqlValue),
    Many(Vec<SqlValue>),
}

/// A filter whose value has been coerced against column metadata
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFilter {
    pub column: String,
    pub op: Operator,
    pub value: BoundValue,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoerceError {
    #[error("invalid blob value: odd-length hex string")]
    OddLengthHex,

    #[error("invalid blob value: bad hex digit {ch:?} at offset {index}")]
    InvalidHexDigit { ch: char, index: usize },

    #[error("invalid blob value: {0}")]
    InvalidHex(String),

    #[error("not an integer: {0}")]
    NotAnInteger(String),

    #[error("not a float: {0}")]
    NotAFloat(String),

    #[error("not a boolean: {0}")]
    NotABoolean(String),

    #[error("expected text, got {0}")]
    NotText(String),

    #[error("operator requires a sequence value")]
    ExpectedSequence,
}

impl From<hex::FromHexError> for CoerceError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::OddLength => Self::OddLengthHex,
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                Self::InvalidHexDigit { ch: c, index }
            }
            hex::FromHexError::InvalidStringLength => {
                Self::InvalidHex("invalid string length".into())
            }
        }
    }
}

impl SemanticType {
    /// Coerce one raw wire value to a bindable parameter.
    ///
    /// Null passes through for every type; nullability is the backend's
    /// constraint to enforce.
    pub fn coerce(self, raw: &Value) -> Result<SqlValue, CoerceError> {
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        match self {
            Self::Integer => match raw {
                Value::Number(n) => n
                    .as_i64()
                    .map(SqlValue::Integer)
                    .ok_or_else(|| CoerceError::NotAnInteger(n.to_string())),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Integer)
                    .map_err(|_| CoerceError::NotAnInteger(s.clone())),
                other => Err(CoerceError::NotAnInteger(other.to_string())),
            },
            Self::Float => match raw {
                Value::Number(n) => n
                    .as_f64()
                    .map(SqlValue::Float)
                    .ok_or_else(|| CoerceError::NotAFloat(n.to_string())),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(SqlValue::Float)
                    .map_err(|_| CoerceError::NotAFloat(s.clone())),
                other => Err(CoerceError::NotAFloat(other.to_string())),
            },
            Self::Binary => match raw {
                Value::String(s) => Ok(SqlValue::Blob(hex::decode(s)?)),
                other => Err(CoerceError::InvalidHex(other.to_string())),
            },
            Self::Text => match raw {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
                other => Err(CoerceError::NotText(other.to_string())),
            },
            Self::Boolean => match raw {
                Value::Bool(b) => Ok(SqlValue::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(SqlValue::Bool(false)),
                    Some(1) => Ok(SqlValue::Bool(true)),
                    _ => Err(CoerceError::NotABoolean(n.to_string())),
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(SqlValue::Bool(true)),
                    "false" | "0" => Ok(SqlValue::Bool(false)),
                    _ => Err(CoerceError::NotABoolean(s.clone())),
                },
                other => Err(CoerceError::NotABoolean(other.to_string())),
            },
            Self::Json => Ok(SqlValue::Json(raw.clone())),
        }
    }
}

/// Coerce a parsed filter against its column's semantic type.
///
/// The `in` operator coerces element-wise over the sequence; every other
/// operator coerces the scalar. Produces a new immutable [`BoundFilter`],
/// leaving the descriptor untouched.
pub fn coerce_filter(filter: &Filter, semantic: SemanticType) -> Result<BoundFilter, QueryError> {
    let against = |raw: &Value| {
        semantic
            .coerce(raw)
            .map_err(|e| QueryError::InvalidParams(format!("column {}: {e}", filter.column)))
    };

    let value = if filter.op.expects_sequence() {
        let items = filter.value.as_array().ok_or_else(|| {
            QueryError::InvalidParams(format!(
                "column {}: {}",
                filter.column,
                CoerceError::ExpectedSequence
            ))
        })?;
        BoundValue::Many(items.iter().map(against).collect::<Result<_, _>>()?)
    } else {
        BoundValue::Single(against(&filter.value)?)
    };

    Ok(BoundFilter {
        column: filter.column.clone(),
        op: filter.op,
        value,
    })
}

/// Bind a JSON literal that already came out of a backend, without column
/// metadata. Used when a fetched value feeds a follow-up lookup.
pub fn bind_literal(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .unwrap_or_else(|| SqlValue::Float(n.as_f64().unwrap_or_default())),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Json(other.clone()),
    }
}

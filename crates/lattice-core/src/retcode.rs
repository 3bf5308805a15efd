//! Result envelope and return codes
//!
//! Every pipeline operation resolves to an [`Envelope`]: a closed status
//! code plus a JSON payload. This is the only shape that crosses the
//! consumer boundary, whether the consumer is an HTTP layer, a CLI, or a
//! test harness.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed result-status enum returned by every pipeline operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetCode {
    /// Operation completed, payload carries the result (possibly empty)
    Success,
    /// No row matched, or the actor may not see any column of the match
    NotFound,
    /// Structurally valid request rejected by schema or backend
    Failed,
    /// Malformed input syntax or an uncoercible value
    InvalidParams,
}

impl RetCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Failed => "FAILED",
            Self::InvalidParams => "INVALID_PARAMS",
        }
    }
}

/// Uniform result contract: status code plus payload
///
/// The payload is a record, a list, a pagination block, an error reason, or
/// null depending on the code and operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: RetCode,
    pub data: Value,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            code: RetCode::Success,
            data,
        }
    }

    pub fn not_found() -> Self {
        Self {
            code: RetCode::NotFound,
            data: Value::Null,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            code: RetCode::Failed,
            data: Value::String(reason.into()),
        }
    }

    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self {
            code: RetCode::InvalidParams,
            data: Value::String(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == RetCode::Success
    }
}

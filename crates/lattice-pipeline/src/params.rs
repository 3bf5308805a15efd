//! Wire-shaped request input

use serde_json::Value;

/// Untrusted textual query input as received from the outer transport.
/// Parsing and validation happen in the pipeline; nothing here is trusted.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Ordered `(key, value)` filter pairs; key is `column` or
    /// `column.operator`
    pub filters: Vec<(String, Value)>,
    /// Comma-separated `column.direction` list
    pub order: Option<String>,
    /// Comma-separated column list, or `*`
    pub select: Option<String>,
    /// JSON object naming foreign-key columns to eager-load
    pub loadfk: Option<Value>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.push((key.into(), value));
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    #[must_use]
    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    #[must_use]
    pub fn with_loadfk(mut self, loadfk: Value) -> Self {
        self.loadfk = Some(loadfk);
        self
    }
}

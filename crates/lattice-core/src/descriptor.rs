//! Query descriptor parsing
//!
//! Turns the flat wire representation of a query - comma-separated select
//! and order strings, `column` / `column.operator` filter keys - into a
//! validated, immutable [`QueryDescriptor`]. All syntax errors surface as
//! [`QueryError::InvalidParams`] before anything touches a backend.
//!
//! Grammar notes:
//!
//! - order tokens must spell a direction (`name.desc`); a bare column name
//!   is dropped, not defaulted
//! - `*` selects every column the actor may read
//! - a filter key with no dot means equality; with one dot the suffix must
//!   be a known operator; two or more dots are malformed

use serde_json::Value;

use crate::error::{QueryError, QueryResult};

/// Comparison operator of a single filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl Operator {
    /// Parse a filter-key suffix. Case-sensitive: wire keys are lowercase.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// `in` binds a sequence of values; every other operator binds a scalar
    pub fn expects_sequence(self) -> bool {
        matches!(self, Self::In)
    }

    pub fn sql_symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "IN",
        }
    }
}

/// Sort direction of one order entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Case-insensitive parse; anything but asc/desc is a syntax error
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn sql_keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `(column, direction)` order entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// Requested projection: everything, or a deduplicated column list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// The `*` sentinel
    #[default]
    All,
    /// Distinct column names in first-occurrence order
    Columns(Vec<String>),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// One `(column, operator, value)` predicate; the value stays raw until
/// type coercion
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: Operator,
    pub value: Value,
}

/// Parsed and validated query input, immutable once built
#[derive(Debug, Clone, Default)]
pub struct QueryDescriptor {
    select: Selection,
    orders: Vec<OrderBy>,
    filters: Vec<Filter>,
}

/// Whether a string is usable as a column name: non-empty, alphanumeric
/// plus underscore
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&self) -> &Selection {
        &self.select
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Parse a comma-separated order string.
    ///
    /// Tokens without a `.direction` suffix yield no entry. A token with
    /// more than one dot, or a direction outside asc/desc, is a syntax
    /// error.
    pub fn parse_order(raw: &str) -> QueryResult<Vec<OrderBy>> {
        let mut orders = Vec::new();

        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let mut parts = token.split('.');
            let column = parts.next().unwrap_or_default();
            let Some(direction) = parts.next() else {
                // Bare column: direction not specified, entry dropped.
                continue;
            };
            if parts.next().is_some() {
                return Err(QueryError::InvalidParams(format!(
                    "malformed order token: {token}"
                )));
            }
            if !is_identifier(column) {
                return Err(QueryError::InvalidParams(format!(
                    "invalid order column: {column}"
                )));
            }
            let direction = OrderDirection::parse(direction).ok_or_else(|| {
                QueryError::InvalidParams(format!("invalid order direction: {direction}"))
            })?;

            orders.push(OrderBy::new(column, direction));
        }

        Ok(orders)
    }

    /// Parse a select string: `*` or comma-separated column names.
    ///
    /// Duplicates collapse; an input with no usable token is an error.
    pub fn parse_select(raw: &str) -> QueryResult<Selection> {
        if raw.trim() == "*" {
            return Ok(Selection::All);
        }

        let mut columns: Vec<String> = Vec::new();
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if !is_identifier(token) {
                return Err(QueryError::InvalidParams(format!(
                    "invalid select column: {token}"
                )));
            }
            if !columns.iter().any(|c| c == token) {
                columns.push(token.to_string());
            }
        }

        if columns.is_empty() {
            return Err(QueryError::InvalidParams("empty select".into()));
        }
        Ok(Selection::Columns(columns))
    }

    /// Parse filter arguments: ordered `(key, value)` pairs where the key
    /// is `column` or `column.operator`.
    pub fn parse_filters<'a, I>(pairs: I) -> QueryResult<Vec<Filter>>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut filters = Vec::new();

        for (key, value) in pairs {
            let mut parts = key.split('.');
            let column = parts.next().unwrap_or_default();
            let op = match parts.next() {
                None => Operator::Eq,
                Some(token) => {
                    if parts.next().is_some() {
                        return Err(QueryError::InvalidParams(format!(
                            "malformed filter key: {key}"
                        )));
                    }
                    Operator::parse(token).ok_or_else(|| {
                        QueryError::InvalidParams(format!("invalid operator: {token}"))
                    })?
                }
            };
            if !is_identifier(column) {
                return Err(QueryError::InvalidParams(format!(
                    "invalid filter column: {column}"
                )));
            }

            filters.push(Filter {
                column: column.to_string(),
                op,
                value,
            });
        }

        Ok(filters)
    }

    /// Install pre-validated order entries.
    pub fn set_orders(&mut self, orders: Vec<OrderBy>) {
        self.orders = orders;
    }

    /// Install a pre-validated selection. Passing an empty column list is a
    /// caller bug, not a user-facing error.
    pub fn set_select(&mut self, select: Selection) {
        if let Selection::Columns(columns) = &select {
            debug_assert!(!columns.is_empty(), "selection must name at least one column");
        }
        self.select = select;
    }

    /// Install pre-validated filter entries.
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
    }
}

//! Shared clause-rendering helpers for the three builders

use lattice_core::descriptor::is_identifier;
use lattice_core::{BoundFilter, BoundValue, OrderBy, Placeholder, SqlValue};

use crate::error::{CompileError, CompileResult};

/// Accumulates positional parameters; `push` hands back the placeholder
/// text for the value it just recorded.
pub(crate) struct ParamBuffer {
    style: Placeholder,
    values: Vec<SqlValue>,
}

impl ParamBuffer {
    pub(crate) fn new(style: Placeholder) -> Self {
        Self {
            style,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        self.style.format(self.values.len())
    }

    pub(crate) fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

/// Validate and double-quote an identifier
pub(crate) fn quote_ident(name: &str) -> CompileResult<String> {
    if !is_identifier(name) {
        return Err(CompileError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}

/// Render AND-conjoined predicates, pushing parameters in filter order.
/// Returns `None` when there is nothing to constrain.
pub(crate) fn render_where(
    filters: &[BoundFilter],
    buf: &mut ParamBuffer,
) -> CompileResult<Option<String>> {
    if filters.is_empty() {
        return Ok(None);
    }

    let mut predicates = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = quote_ident(&filter.column)?;
        match &filter.value {
            BoundValue::Single(value) => {
                let placeholder = buf.push(value.clone());
                predicates.push(format!(
                    "{column} {} {placeholder}",
                    filter.op.sql_symbol()
                ));
            }
            BoundValue::Many(values) if values.is_empty() => {
                // An empty membership set matches nothing; emit a constant
                // false predicate instead of invalid `IN ()` syntax.
                predicates.push("1 = 0".to_string());
            }
            BoundValue::Many(values) => {
                let placeholders: Vec<String> =
                    values.iter().map(|v| buf.push(v.clone())).collect();
                predicates.push(format!("{column} IN ({})", placeholders.join(", ")));
            }
        }
    }

    Ok(Some(predicates.join(" AND ")))
}

/// Render an ORDER BY clause body, or `None` when unordered
pub(crate) fn render_order(orders: &[OrderBy]) -> CompileResult<Option<String>> {
    if orders.is_empty() {
        return Ok(None);
    }

    let mut entries = Vec::with_capacity(orders.len());
    for order in orders {
        entries.push(format!(
            "{} {}",
            quote_ident(&order.column)?,
            order.direction.sql_keyword()
        ));
    }
    Ok(Some(entries.join(", ")))
}

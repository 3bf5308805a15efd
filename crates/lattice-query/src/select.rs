//! SELECT statement builder

use lattice_core::{BoundFilter, CompiledQuery, OrderBy, Placeholder, Selection};

use crate::clause::{quote_ident, render_order, render_where, ParamBuffer};
use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone)]
enum Projection {
    Columns(Selection),
    Count,
}

/// Builder for SELECT statements, including the COUNT(*) mode used to
/// total a result set before fetching a page.
///
/// The same descriptor may drive both the count and the page statement:
/// `order_by` is accepted in count mode but not emitted, since a COUNT(*)
/// result is order-invariant and some backends reject ordered aggregates.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    style: Placeholder,
    projection: Projection,
    table: Option<String>,
    filters: Vec<BoundFilter>,
    orders: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new(style: Placeholder) -> Self {
        Self {
            style,
            projection: Projection::Columns(Selection::All),
            table: None,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Project the given selection (`*` or an explicit column list)
    pub fn select_columns(&mut self, selection: &Selection) -> &mut Self {
        self.projection = Projection::Columns(selection.clone());
        self
    }

    /// Project `COUNT(*) AS count` over the same WHERE clause
    pub fn select_count(&mut self) -> &mut Self {
        self.projection = Projection::Count;
        self
    }

    pub fn from_table(&mut self, table: &str) -> &mut Self {
        self.table = Some(table.to_string());
        self
    }

    /// Append AND-conjoined predicates
    pub fn where_filters(&mut self, filters: &[BoundFilter]) -> &mut Self {
        self.filters.extend_from_slice(filters);
        self
    }

    pub fn order_by(&mut self, orders: &[OrderBy]) -> &mut Self {
        self.orders.extend_from_slice(orders);
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Finalize into SQL text plus positional parameters
    pub fn sql(&self) -> CompileResult<CompiledQuery> {
        let table = self.table.as_deref().ok_or(CompileError::MissingTable)?;
        let mut buf = ParamBuffer::new(self.style);

        let projection = match &self.projection {
            Projection::Count => "COUNT(*) AS count".to_string(),
            Projection::Columns(Selection::All) => "*".to_string(),
            Projection::Columns(Selection::Columns(columns)) => columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<CompileResult<Vec<_>>>()?
                .join(", "),
        };

        let mut sql = format!("SELECT {projection} FROM {}", quote_ident(table)?);

        if let Some(where_body) = render_where(&self.filters, &mut buf)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_body);
        }

        if !matches!(self.projection, Projection::Count) {
            if let Some(order_body) = render_order(&self.orders)? {
                sql.push_str(" ORDER BY ");
                sql.push_str(&order_body);
            }
            if let Some(n) = self.limit {
                sql.push_str(&format!(" LIMIT {n}"));
            }
            if let Some(n) = self.offset {
                sql.push_str(&format!(" OFFSET {n}"));
            }
        }

        Ok(CompiledQuery {
            sql,
            params: buf.into_values(),
        })
    }

    /// Clear accumulated clauses, keeping the placeholder style
    pub fn reset(&mut self) {
        *self = Self::new(self.style);
    }
}

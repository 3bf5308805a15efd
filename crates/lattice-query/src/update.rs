//! UPDATE statement builder

use lattice_core::{BoundFilter, CompiledQuery, Placeholder, SqlValue};

use crate::clause::{quote_ident, render_where, ParamBuffer};
use crate::error::{CompileError, CompileResult};

/// Builder for UPDATE statements. SET parameters are numbered before WHERE
/// parameters, matching their order in the emitted SQL.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    style: Placeholder,
    table: Option<String>,
    filters: Vec<BoundFilter>,
    values: Vec<(String, SqlValue)>,
}

impl UpdateBuilder {
    pub fn new(style: Placeholder) -> Self {
        Self {
            style,
            table: None,
            filters: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn to_table(&mut self, table: &str) -> &mut Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn where_filters(&mut self, filters: &[BoundFilter]) -> &mut Self {
        self.filters.extend_from_slice(filters);
        self
    }

    /// Append column assignments in the given order
    pub fn set_values(&mut self, values: &[(String, SqlValue)]) -> &mut Self {
        self.values.extend_from_slice(values);
        self
    }

    pub fn sql(&self) -> CompileResult<CompiledQuery> {
        let table = self.table.as_deref().ok_or(CompileError::MissingTable)?;
        if self.values.is_empty() {
            return Err(CompileError::EmptyValues);
        }

        let mut buf = ParamBuffer::new(self.style);
        let mut assignments = Vec::with_capacity(self.values.len());
        for (column, value) in &self.values {
            let placeholder = buf.push(value.clone());
            assignments.push(format!("{} = {placeholder}", quote_ident(column)?));
        }

        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(table)?,
            assignments.join(", ")
        );
        if let Some(where_body) = render_where(&self.filters, &mut buf)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_body);
        }

        Ok(CompiledQuery {
            sql,
            params: buf.into_values(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.style);
    }
}

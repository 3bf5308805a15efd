//! INSERT statement builder

use lattice_core::{CompiledQuery, Placeholder, SqlValue};

use crate::clause::{quote_ident, ParamBuffer};
use crate::error::{CompileError, CompileResult};

/// Builder for INSERT statements with optional `RETURNING *`.
///
/// When the target backend cannot return the inserted row in one round
/// trip, emulating the fetch is the adapter's responsibility, not the
/// compiler's.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    style: Placeholder,
    table: Option<String>,
    values: Vec<(String, SqlValue)>,
    returning: bool,
}

impl InsertBuilder {
    pub fn new(style: Placeholder) -> Self {
        Self {
            style,
            table: None,
            values: Vec::new(),
            returning: false,
        }
    }

    pub fn into_table(&mut self, table: &str) -> &mut Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn set_values(&mut self, values: &[(String, SqlValue)]) -> &mut Self {
        self.values.extend_from_slice(values);
        self
    }

    /// Request the inserted row back in the same round trip
    pub fn returning(&mut self) -> &mut Self {
        self.returning = true;
        self
    }

    pub fn sql(&self) -> CompileResult<CompiledQuery> {
        let table = self.table.as_deref().ok_or(CompileError::MissingTable)?;
        if self.values.is_empty() {
            return Err(CompileError::EmptyValues);
        }

        let mut buf = ParamBuffer::new(self.style);
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        for (column, value) in &self.values {
            columns.push(quote_ident(column)?);
            placeholders.push(buf.push(value.clone()));
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table)?,
            columns.join(", "),
            placeholders.join(", ")
        );
        if self.returning {
            sql.push_str(" RETURNING *");
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

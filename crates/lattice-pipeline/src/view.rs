//! The four request operations
//!
//! Each operation is a straight-line traversal: parse → schema check →
//! permission filter → coerce → compile → execute → post-filter. The first
//! failure aborts the request; the public methods convert every internal
//! error into an [`Envelope`] so nothing else crosses the boundary.

use std::sync::Arc;

use lattice_core::coerce::{bind_literal, coerce_filter};
use lattice_core::{
    page_offset, pagination_calc, Ability, Action, Actor, BoundFilter, BoundValue, Envelope,
    Operator, PermissionProvider, QueryDescriptor, QueryError, QueryResult, Record, Selection,
    SqlValue,
};
use lattice_query::{InsertBuilder, SelectBuilder, UpdateBuilder};
use serde_json::{json, Value};
use tracing::debug;

use crate::binding::{ColumnSet, TableBinding};
use crate::params::QueryParams;

/// A table plus a permission policy, exposing the request operations
pub struct TableView {
    binding: Arc<TableBinding>,
    permissions: Arc<dyn PermissionProvider>,
}

impl TableView {
    pub fn new(binding: Arc<TableBinding>, permissions: Arc<dyn PermissionProvider>) -> Self {
        Self {
            binding,
            permissions,
        }
    }

    /// Fetch the first record matching the filters, read-filtered for the
    /// actor. A match the actor may not see any column of reports
    /// NOT_FOUND, same as no match at all.
    pub async fn fetch_one(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
    ) -> Envelope {
        self.fetch_one_inner(actor, role, params)
            .await
            .unwrap_or_else(Envelope::from)
    }

    /// Fetch one page of matching records plus pagination totals. Items
    /// are value-lists in the selection's column order.
    pub async fn fetch_list(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
        size: u64,
        page: u64,
    ) -> Envelope {
        self.fetch_list_inner(actor, role, params, size, page)
            .await
            .unwrap_or_else(Envelope::from)
    }

    /// Update matching records with the write-permitted subset of the
    /// payload. Zero affected rows is SUCCESS with `count: 0`.
    pub async fn update(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
        payload: &Record,
    ) -> Envelope {
        self.update_inner(actor, role, params, payload)
            .await
            .unwrap_or_else(Envelope::from)
    }

    /// Insert one record and return it as the backend reports it
    pub async fn insert(&self, payload: &Record) -> Envelope {
        self.insert_inner(payload)
            .await
            .unwrap_or_else(Envelope::from)
    }

    // =========================================================================
    // Pipeline steps
    // =========================================================================

    fn parse(params: &QueryParams) -> QueryResult<QueryDescriptor> {
        let mut descriptor = QueryDescriptor::new();
        descriptor.set_filters(QueryDescriptor::parse_filters(
            params.filters.iter().map(|(k, v)| (k.as_str(), v.clone())),
        )?);
        if let Some(order) = &params.order {
            descriptor.set_orders(QueryDescriptor::parse_order(order)?);
        }
        if let Some(select) = &params.select {
            descriptor.set_select(QueryDescriptor::parse_select(select)?);
        }
        Ok(descriptor)
    }

    /// Every referenced column must exist. Unknown names are a schema
    /// problem (FAILED), distinct from malformed syntax (INVALID_PARAMS)
    /// which parse already rejected.
    fn check_schema(descriptor: &QueryDescriptor, cols: &ColumnSet) -> QueryResult<()> {
        for filter in descriptor.filters() {
            if !cols.contains(&filter.column) {
                return Err(QueryError::ColumnNotFound(filter.column.clone()));
            }
        }
        for order in descriptor.orders() {
            if !cols.contains(&order.column) {
                return Err(QueryError::ColumnNotFound(order.column.clone()));
            }
        }
        if let Selection::Columns(columns) = descriptor.select() {
            for column in columns {
                if !cols.contains(column) {
                    return Err(QueryError::ColumnNotFound(column.clone()));
                }
            }
        }
        Ok(())
    }

    /// The columns the actor may read out of the requested selection, in
    /// selection order
    fn readable_selection(
        descriptor: &QueryDescriptor,
        cols: &ColumnSet,
        ability: &Ability,
    ) -> Vec<String> {
        match descriptor.select() {
            Selection::All => ability.filter_columns(cols.names(), Action::Read),
            Selection::Columns(columns) => {
                ability.filter_columns(columns.iter().map(String::as_str), Action::Read)
            }
        }
    }

    fn coerce_filters(
        descriptor: &QueryDescriptor,
        cols: &ColumnSet,
    ) -> QueryResult<Vec<BoundFilter>> {
        descriptor
            .filters()
            .iter()
            .map(|filter| {
                let meta = cols
                    .get(&filter.column)
                    .ok_or_else(|| QueryError::ColumnNotFound(filter.column.clone()))?;
                coerce_filter(filter, meta.semantic)
            })
            .collect()
    }

    fn coerce_payload(
        payload: &Record,
        cols: &ColumnSet,
    ) -> QueryResult<Vec<(String, SqlValue)>> {
        payload
            .iter()
            .map(|(column, raw)| {
                let meta = cols
                    .get(column)
                    .ok_or_else(|| QueryError::ColumnNotFound(column.clone()))?;
                let value = meta
                    .semantic
                    .coerce(raw)
                    .map_err(|e| QueryError::InvalidParams(format!("column {column}: {e}")))?;
                Ok((column.clone(), value))
            })
            .collect()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    async fn fetch_one_inner(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
    ) -> QueryResult<Envelope> {
        let descriptor = Self::parse(params)?;
        let cols = self.binding.columns().await?;
        Self::check_schema(&descriptor, &cols)?;

        let ability = self.permissions.resolve(actor, role);
        let readable = Self::readable_selection(&descriptor, &cols, &ability);
        if readable.is_empty() {
            // Zero readable columns is indistinguishable from a missing row.
            return Ok(Envelope::not_found());
        }
        let bound = Self::coerce_filters(&descriptor, &cols)?;

        let mut sc = SelectBuilder::new(self.binding.backend().placeholder());
        let query = sc
            .select_columns(&Selection::Columns(readable))
            .from_table(self.binding.table())
            .where_filters(&bound)
            .order_by(descriptor.orders())
            .limit(1)
            .sql()?;
        debug!(sql = %query.sql, "compiled fetch-one");

        let Some(row) = self.binding.backend().fetch_one(query).await? else {
            return Ok(Envelope::not_found());
        };

        let mut record = ability.filter_record(&row, Action::Read);
        if record.is_empty() {
            return Ok(Envelope::not_found());
        }

        if let Some(loadfk) = &params.loadfk {
            self.apply_loadfk(&mut record, loadfk, &cols).await?;
        }

        Ok(Envelope::success(Value::Object(record)))
    }

    async fn fetch_list_inner(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
        size: u64,
        page: u64,
    ) -> QueryResult<Envelope> {
        if size < 1 {
            return Err(QueryError::InvalidParams("page size must be at least 1".into()));
        }
        if page < 1 {
            return Err(QueryError::InvalidParams("page number must be at least 1".into()));
        }

        let descriptor = Self::parse(params)?;
        let cols = self.binding.columns().await?;
        Self::check_schema(&descriptor, &cols)?;

        let ability = self.permissions.resolve(actor, role);
        let readable = Self::readable_selection(&descriptor, &cols, &ability);
        if readable.is_empty() {
            return Ok(Envelope::not_found());
        }
        let bound = Self::coerce_filters(&descriptor, &cols)?;

        // One descriptor drives both statements; the count builder takes
        // the order and leaves it out of the emitted SQL.
        let mut sc = SelectBuilder::new(self.binding.backend().placeholder());
        let count_query = sc
            .select_count()
            .from_table(self.binding.table())
            .where_filters(&bound)
            .order_by(descriptor.orders())
            .sql()?;
        let total = match self.binding.backend().fetch_one(count_query).await? {
            Some(row) => row.get("count").and_then(Value::as_u64).unwrap_or(0),
            None => 0,
        };

        let mut block = pagination_calc(total, size, page);

        sc.reset();
        let page_query = sc
            .select_columns(&Selection::Columns(readable.clone()))
            .from_table(self.binding.table())
            .where_filters(&bound)
            .order_by(descriptor.orders())
            .limit(size)
            .offset(page_offset(size, page))
            .sql()?;
        debug!(sql = %page_query.sql, total, "compiled page fetch");

        let rows = self.binding.backend().fetch_all(page_query).await?;
        block.items = rows
            .iter()
            .map(|row| {
                readable
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        let payload =
            serde_json::to_value(block).map_err(|e| QueryError::Backend(e.to_string()))?;
        Ok(Envelope::success(payload))
    }

    async fn update_inner(
        &self,
        actor: &Actor,
        role: Option<&str>,
        params: &QueryParams,
        payload: &Record,
    ) -> QueryResult<Envelope> {
        let descriptor = Self::parse(params)?;
        let cols = self.binding.columns().await?;
        Self::check_schema(&descriptor, &cols)?;
        for column in payload.keys() {
            if !cols.contains(column) {
                return Err(QueryError::ColumnNotFound(column.clone()));
            }
        }

        let ability = self.permissions.resolve(actor, role);
        let writable = ability.filter_record(payload, Action::Write);
        if writable.is_empty() {
            return Err(QueryError::NoWritableColumns);
        }

        let bound = Self::coerce_filters(&descriptor, &cols)?;
        let values = Self::coerce_payload(&writable, &cols)?;

        let mut uc = UpdateBuilder::new(self.binding.backend().placeholder());
        let query = uc
            .to_table(self.binding.table())
            .where_filters(&bound)
            .set_values(&values)
            .sql()?;
        debug!(sql = %query.sql, "compiled update");

        let count = self.binding.backend().execute(query).await?;
        Ok(Envelope::success(json!({ "count": count })))
    }

    async fn insert_inner(&self, payload: &Record) -> QueryResult<Envelope> {
        if payload.is_empty() {
            return Err(QueryError::InvalidParams("empty payload".into()));
        }
        let cols = self.binding.columns().await?;
        for column in payload.keys() {
            if !cols.contains(column) {
                return Err(QueryError::ColumnNotFound(column.clone()));
            }
        }
        let values = Self::coerce_payload(payload, &cols)?;

        let mut ic = InsertBuilder::new(self.binding.backend().placeholder());
        let query = ic
            .into_table(self.binding.table())
            .set_values(&values)
            .returning()
            .sql()?;
        debug!(sql = %query.sql, "compiled insert");

        let row = self
            .binding
            .backend()
            .fetch_one(query)
            .await?
            .ok_or_else(|| QueryError::Backend("insert returned no row".into()))?;
        Ok(Envelope::success(Value::Object(row)))
    }

    /// Embed foreign-key-referenced records into a fetched record, one
    /// level deep
    async fn apply_loadfk(
        &self,
        record: &mut Record,
        loadfk: &Value,
        cols: &ColumnSet,
    ) -> QueryResult<()> {
        let Some(requests) = loadfk.as_object() else {
            return Err(QueryError::EagerLoad(
                "expected an object keyed by column name".into(),
            ));
        };

        for column in requests.keys() {
            let meta = cols
                .get(column)
                .ok_or_else(|| QueryError::EagerLoad(format!("unknown column: {column}")))?;
            let fk = meta.references.as_ref().ok_or_else(|| {
                QueryError::EagerLoad(format!("column {column} is not a foreign key"))
            })?;

            // A key the read filter removed stays removed.
            let Some(key) = record.get(column) else {
                continue;
            };
            if key.is_null() {
                continue;
            }

            let filter = BoundFilter {
                column: fk.column.clone(),
                op: Operator::Eq,
                value: BoundValue::Single(bind_literal(key)),
            };
            let mut sc = SelectBuilder::new(self.binding.backend().placeholder());
            let query = sc
                .from_table(&fk.table)
                .where_filters(&[filter])
                .limit(1)
                .sql()?;
            debug!(sql = %query.sql, column = %column, "compiled eager load");

            let referenced = self.binding.backend().fetch_one(query).await?;
            record.insert(
                column.clone(),
                referenced.map(Value::Object).unwrap_or(Value::Null),
            );
        }
        Ok(())
    }
}

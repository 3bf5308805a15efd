//! Table bindings and the column-metadata cache

use std::collections::HashMap;
use std::sync::Arc;

use lattice_core::{Backend, BackendError, ColumnMeta};
use tokio::sync::OnceCell;
use tracing::info;

/// Immutable, ordered view of a table's columns
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<ColumnMeta>,
    index: HashMap<String, usize>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { columns, index }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnMeta> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One table bound to a backend.
///
/// Column metadata is fetched on first use with single-flight
/// initialization: the first caller performs the fetch, concurrent callers
/// await the same in-flight result, and the cell is written exactly once.
/// The metadata is immutable for the binding's lifetime.
pub struct TableBinding {
    backend: Arc<dyn Backend>,
    table: String,
    columns: OnceCell<Arc<ColumnSet>>,
}

impl TableBinding {
    pub fn new(backend: Arc<dyn Backend>, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
            columns: OnceCell::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// The table's column metadata, fetching it on first call
    pub async fn columns(&self) -> Result<Arc<ColumnSet>, BackendError> {
        self.columns
            .get_or_try_init(|| async {
                let metas = self.backend.fetch_columns(&self.table).await?;
                info!(table = %self.table, columns = metas.len(), "bound column metadata");
                Ok(Arc::new(ColumnSet::new(metas)))
            })
            .await
            .map(Arc::clone)
    }
}

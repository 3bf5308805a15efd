//! Backend contract implementation over rusqlite
//!
//! rusqlite is synchronous, so every driver call hops to the blocking
//! thread pool; the connection mutex is held only inside the closure, so
//! it is released on every exit path.

use async_trait::async_trait;
use lattice_core::descriptor::is_identifier;
use lattice_core::{
    Backend, BackendError, ColumnMeta, CompiledQuery, ForeignKey, Placeholder, Record,
    SemanticType, SqlValue,
};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};
use tracing::debug;

use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};

/// SQLite implementation of the Lattice backend contract
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Declared-type → semantic mapping.
///
/// SQLite declared types are free-form, so a parenthesized length suffix
/// (`VARCHAR(255)`) is stripped before lookup. An unmapped name fails the
/// bind rather than letting values pass through unconverted.
fn semantic_from_decl(decl: &str) -> Option<SemanticType> {
    let decl = decl.trim().to_ascii_uppercase();
    let base = decl.split('(').next().unwrap_or_default().trim_end();
    match base {
        "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "INT2" | "INT4" | "INT8" => {
            Some(SemanticType::Integer)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT4" | "FLOAT8" | "NUMERIC"
        | "DECIMAL" => Some(SemanticType::Float),
        "BLOB" | "BYTEA" => Some(SemanticType::Binary),
        "TEXT" | "VARCHAR" | "CHAR" | "CLOB" | "STRING" => Some(SemanticType::Text),
        "BOOLEAN" | "BOOL" => Some(SemanticType::Boolean),
        "JSON" | "JSONB" => Some(SemanticType::Json),
        _ => None,
    }
}

fn to_sql_value(value: &SqlValue) -> rusqlite::types::Value {
    match value {
        SqlValue::Null => rusqlite::types::Value::Null,
        SqlValue::Integer(i) => rusqlite::types::Value::Integer(*i),
        SqlValue::Float(f) => rusqlite::types::Value::Real(*f),
        SqlValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
        SqlValue::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
        SqlValue::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        SqlValue::Json(v) => rusqlite::types::Value::Text(v.to_string()),
    }
}

/// Stored values come back as JSON: integers and reals as numbers, text as
/// strings, blobs re-encoded as hex text
fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(hex::encode(b)),
    }
}

fn query_rows(conn: &Connection, query: &CompiledQuery) -> SqliteResult<Vec<Record>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let params = rusqlite::params_from_iter(query.params.iter().map(to_sql_value));
    let mut rows = stmt.query(params)?;

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::new();
        for (i, name) in names.iter().enumerate() {
            record.insert(name.clone(), from_sql_value(row.get_ref(i)?));
        }
        records.push(record);
    }
    Ok(records)
}

fn fetch_columns_blocking(conn: &Connection, table: &str) -> SqliteResult<Vec<ColumnMeta>> {
    if !is_identifier(table) {
        return Err(SqliteError::TableNotFound(table.to_string()));
    }

    let mut columns = Vec::new();
    {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let decl: String = row.get("type")?;
            let notnull: bool = row.get("notnull")?;

            let semantic =
                semantic_from_decl(&decl).ok_or_else(|| SqliteError::UnknownColumnType {
                    column: name.clone(),
                    type_name: decl.clone(),
                })?;
            columns.push(ColumnMeta {
                name,
                semantic,
                nullable: !notnull,
                references: None,
            });
        }
    }
    if columns.is_empty() {
        return Err(SqliteError::TableNotFound(table.to_string()));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list(\"{table}\")"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let from: String = row.get("from")?;
        let target: String = row.get("table")?;
        // `to` is NULL when the reference points at the target's primary key
        let to: Option<String> = row.get("to")?;

        if let Some(meta) = columns.iter_mut().find(|c| c.name == from) {
            meta.references = Some(ForeignKey {
                table: target,
                column: to.unwrap_or_else(|| "id".to_string()),
            });
        }
    }

    Ok(columns)
}

async fn run_blocking<T, F>(f: F) -> Result<T, BackendError>
where
    F: FnOnce() -> SqliteResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SqliteError::Join(e.to_string()))?
        .map_err(Into::into)
}

#[async_trait]
impl Backend for SqliteBackend {
    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<ColumnMeta>, BackendError> {
        let pool = self.pool.clone();
        let table = table.to_string();

        run_blocking(move || pool.with_connection(|conn| fetch_columns_blocking(conn, &table)))
            .await
    }

    async fn execute(&self, query: CompiledQuery) -> Result<u64, BackendError> {
        let pool = self.pool.clone();

        run_blocking(move || {
            pool.with_connection(|conn| {
                debug!(sql = %query.sql, "execute");
                let params = rusqlite::params_from_iter(query.params.iter().map(to_sql_value));
                let affected = conn.execute(&query.sql, params)?;
                Ok(affected as u64)
            })
        })
        .await
    }

    async fn fetch_one(&self, query: CompiledQuery) -> Result<Option<Record>, BackendError> {
        let pool = self.pool.clone();

        run_blocking(move || {
            pool.with_connection(|conn| {
                debug!(sql = %query.sql, "fetch one");
                Ok(query_rows(conn, &query)?.into_iter().next())
            })
        })
        .await
    }

    async fn fetch_all(&self, query: CompiledQuery) -> Result<Vec<Record>, BackendError> {
        let pool = self.pool.clone();

        run_blocking(move || {
            pool.with_connection(|conn| {
                debug!(sql = %query.sql, "fetch all");
                query_rows(conn, &query)
            })
        })
        .await
    }
}

//! SQLite backend adapter for Lattice
//!
//! Implements the `lattice_core::Backend` contract over `rusqlite`:
//!
//! - **Connection handling**: `Arc<Mutex<Connection>>` behind [`SqlitePool`],
//!   with WAL mode and pragma tuning for file databases
//! - **Async surface**: every driver call runs inside
//!   `tokio::task::spawn_blocking`
//! - **Metadata**: `PRAGMA table_info` / `PRAGMA foreign_key_list` mapped to
//!   semantic column types, failing fast on unrecognized declared types
//! - **RETURNING**: supported natively (modern_sqlite), so inserts come back
//!   in one round trip

pub mod backend;
pub mod config;
pub mod connection;
pub mod error;

// Re-exports
pub use backend::SqliteBackend;
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};

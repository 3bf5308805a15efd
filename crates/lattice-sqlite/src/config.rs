//! SQLite adapter configuration

use std::path::{Path, PathBuf};

/// Connection configuration for the SQLite adapter
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:`
    pub path: PathBuf,
    /// WAL journal mode for better read concurrency (file databases only)
    pub wal_mode: bool,
    /// Enforce foreign keys
    pub foreign_keys: bool,
    /// How long a locked database is retried before erroring
    pub busy_timeout_ms: u32,
    /// Page-cache size in KiB (negative per SQLite convention)
    pub cache_size: i64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            cache_size: -64000,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// In-memory database, handy for tests
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}

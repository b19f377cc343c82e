use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::config::StorageOptions;

pub mod items;
mod schema;

pub use items::ItemRepository;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("opening store {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored entry '{key}' is not a JSON list of strings")]
    CorruptEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding entry '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage with whole-value reads and writes.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;

    /// When the entry was last written, if the backend tracks it.
    fn entry_updated_at(&self, _key: &str) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(None)
    }
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&*self.db_path).map_err(|source| StoreError::Open {
            path: self.db_path.to_path_buf(),
            source,
        })?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

impl KeyValueStore for StorageHandle {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?)
        })
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, now],
            )?;
            Ok(())
        })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    fn entry_updated_at(&self, key: &str) -> Result<Option<OffsetDateTime>, StoreError> {
        let epoch: Option<i64> = self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT updated_at FROM kv_entries WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        Ok(epoch.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok()))
    }
}

/// Process-local store for throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self { entries }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

pub fn init(storage: &StorageOptions) -> Result<StorageHandle> {
    let db_path = &storage.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn).context("applying schema migrations")?;
    tracing::debug!(path = %db_path.display(), "store ready");
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<(), StoreError> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )?;
    Ok(())
}

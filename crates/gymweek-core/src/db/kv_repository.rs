//! Key-value persistence for local JSON blobs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::db::Database;
use crate::error::{Error, Result};

/// Durable on-device string storage keyed by logical entity.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value for `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value for `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<()>;
}

/// libSQL implementation of `KeyValueStore`
#[derive(Clone)]
pub struct LibSqlKeyValueStore {
    db: Arc<Database>,
}

impl LibSqlKeyValueStore {
    /// Create a store over an opened database
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }
}

impl KeyValueStore for LibSqlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT value FROM kv WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
                libsql::params![key, value, now],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

/// In-memory `KeyValueStore`; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failing_key: Arc<Mutex<Option<String>>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make writes and deletes of `key` fail until cleared with `None`.
    pub fn fail_writes(&self, key: Option<&str>) {
        if let Ok(mut failing) = self.failing_key.lock() {
            *failing = key.map(str::to_string);
        }
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        let failing = self
            .failing_key
            .lock()
            .map_err(|error| Error::Database(error.to_string()))?;
        match failing.as_deref() {
            Some(blocked) if blocked == key => {
                Err(Error::Database(format!("storage unavailable for {key}")))
            }
            _ => Ok(()),
        }
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|error| Error::Database(error.to_string()))?;
        Ok(f(&mut guard))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

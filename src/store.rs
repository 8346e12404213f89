use crate::error::StoreError;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DB_FILE_NAME: &str = "labcheck.sqlite3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    ClassDetails,
    StudentRoster,
    AttendanceRecords,
}

impl StoreKey {
    /// Lock order used by anything that holds more than one key.
    pub const ALL: [StoreKey; 3] = [
        StoreKey::ClassDetails,
        StoreKey::StudentRoster,
        StoreKey::AttendanceRecords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::ClassDetails => "classDetails",
            StoreKey::StudentRoster => "studentRoster",
            StoreKey::AttendanceRecords => "students",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key/value contract the session coordinator writes through.
/// `Ok(None)` from `get` means the key was never written (or was removed).
pub trait KvStore: Send + Sync {
    fn get(&self, key: StoreKey) -> Result<Option<serde_json::Value>, StoreError>;
    fn set(&self, key: StoreKey, value: &serde_json::Value) -> Result<(), StoreError>;
    fn remove(&self, key: StoreKey) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StoreKey, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<StoreKey, serde_json::Value>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.values().get(&key).cloned())
    }

    fn set(&self, key: StoreKey, value: &serde_json::Value) -> Result<(), StoreError> {
        self.values().insert(key, value.clone());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        self.values().remove(&key);
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) `<workspace>/labcheck.sqlite3`.
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace).with_context(|| {
            format!(
                "failed to create workspace {}",
                workspace.to_string_lossy()
            )
        })?;
        let db_path = workspace.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT
            )",
            [],
        )
        .context("failed to create kv table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: StoreKey) -> Result<Option<serde_json::Value>, StoreError> {
        let text: Option<String> = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?", [key.as_str()], |r| {
                r.get(0)
            })
            .optional()
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        let Some(text) = text else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key,
                message: e.to_string(),
            })
    }

    fn set(&self, key: StoreKey, value: &serde_json::Value) -> Result<(), StoreError> {
        let text = value.to_string();
        self.conn()
            .execute(
                "INSERT INTO kv(key, value, updated_at)
                 VALUES(?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                (key.as_str(), &text, now_unix_string()),
            )
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?", [key.as_str()])
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(())
    }
}

fn now_unix_string() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

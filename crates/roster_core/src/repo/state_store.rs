//! Key-value persistence collaborator contracts and implementations.
//!
//! # Responsibility
//! - Provide get/set of named string values, the only storage contract the
//!   board needs.
//! - Keep SQLite details inside the repository boundary.
//!
//! # Invariants
//! - `set` overwrites the whole value for a key.
//! - `set_all` lands every entry or none of them.
//! - SQLite-backed stores only accept connections at the latest schema version.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from persistence operations.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Board state could not be serialized.
    Encode(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode board state: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "state store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// String-valued key-value storage.
pub trait StateStore {
    /// Loads one value; `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Writes one value.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Writes several values as one unit; on error nothing was written.
    fn set_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()>;
}

/// In-memory store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store with raw key/value pairs.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            writes: 0,
        }
    }

    /// Number of `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// SQLite-backed store over the `kv_entries` table.
pub struct SqliteStateStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> StorageResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(StorageError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl StateStore for SqliteStateStore<'_> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value
                 FROM kv_entries
                 WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        upsert_entry(self.conn, key, value)
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        // The connection is shared by reference, so the transaction is opened unchecked.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            upsert_entry(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn upsert_entry(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value)
         VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemoryStateStore, SqliteStateStore, StateStore, StorageError};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryStateStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn sqlite_store_overwrites_values() {
        let conn = open_db_in_memory().unwrap();
        let mut store = SqliteStateStore::try_new(&conn).unwrap();
        store.set("scheduleAppNames", "[]").unwrap();
        store.set("scheduleAppNames", "[\"Alice\"]").unwrap();
        assert_eq!(
            store.get("scheduleAppNames").unwrap().as_deref(),
            Some("[\"Alice\"]")
        );
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn sqlite_batch_rolls_back_when_one_write_fails() {
        let conn = open_db_in_memory().unwrap();
        let mut store = SqliteStateStore::try_new(&conn).unwrap();
        store.set("scheduleAppNames", "[\"Alice\"]").unwrap();
        store.set("scheduleAppHourlyAssignments", "{}").unwrap();
        conn.execute_batch(
            "CREATE TRIGGER block_grid BEFORE UPDATE ON kv_entries
             WHEN NEW.key = 'scheduleAppHourlyAssignments'
             BEGIN SELECT RAISE(ABORT, 'grid writes blocked'); END;",
        )
        .unwrap();

        let result = store.set_all(&[
            ("scheduleAppNames", "[]".to_string()),
            (
                "scheduleAppHourlyAssignments",
                r#"{"panel-1":["Alice"]}"#.to_string(),
            ),
        ]);

        assert!(result.is_err());
        assert_eq!(
            store.get("scheduleAppNames").unwrap().as_deref(),
            Some("[\"Alice\"]")
        );
        assert_eq!(
            store.get("scheduleAppHourlyAssignments").unwrap().as_deref(),
            Some("{}")
        );
        assert!(conn.is_autocommit());
    }

    #[test]
    fn sqlite_store_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteStateStore::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            StorageError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }
}

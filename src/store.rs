//! Persisted alarm times.
//!
//! The store only enforces uniqueness; callers hand it already validated
//! [`AlarmTime`]s.

use std::path::{Path, PathBuf};

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{alarm::AlarmTime, error::StoreError};

/// Outcome of [`AlarmStore::insert`]. A duplicate is a conflict, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Added,
    Duplicate,
}

pub trait AlarmStore {
    /// All configured times, ascending.
    fn list(&self) -> Result<Vec<AlarmTime>, StoreError>;
    fn insert(&self, time: AlarmTime) -> Result<Insert, StoreError>;
    /// Removing a time that is not stored is not an error.
    fn delete(&self, time: AlarmTime) -> Result<(), StoreError>;

    fn contains(&self, time: AlarmTime) -> Result<bool, StoreError> {
        Ok(self.list()?.contains(&time))
    }
}

/// SQLite backed store. Every call opens its own connection so nothing is held
/// between scheduler ticks.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Creates the database file and the `horarios` table when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        store.connect()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS horarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hora TEXT NOT NULL
            );",
        )?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }
}

impl AlarmStore for SqliteStore {
    fn list(&self) -> Result<Vec<AlarmTime>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT hora FROM horarios ORDER BY hora")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut times = Vec::new();
        for row in rows {
            let hora = row?;
            // rows written by other tools may not be canonical
            match hora.parse::<AlarmTime>() {
                Ok(time) => times.push(time),
                Err(err) => warn!("skipping stored alarm {hora:?}: {err}"),
            }
        }
        times.sort_unstable();
        times.dedup();
        Ok(times)
    }

    fn insert(&self, time: AlarmTime) -> Result<Insert, StoreError> {
        let conn = self.connect()?;
        let hora = time.to_string();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM horarios WHERE hora = ?1",
                params![hora],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(Insert::Duplicate);
        }
        conn.execute("INSERT INTO horarios (hora) VALUES (?1)", params![hora])?;
        Ok(Insert::Added)
    }

    fn delete(&self, time: AlarmTime) -> Result<(), StoreError> {
        self.connect()?.execute(
            "DELETE FROM horarios WHERE hora = ?1",
            params![time.to_string()],
        )?;
        Ok(())
    }
}

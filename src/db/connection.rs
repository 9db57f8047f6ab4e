//! SQLite connection management for the module database.
//!
//! CHANGELOG:
//! - 06/02/2026 - Read-modify-write counters
//! - 03/02/2026 - Shared handle so tracker, history and recent contact use
//!   one connection
//! - 02/02/2026 - Initial implementation

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::queries;

/// Shared handle to the module database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open module database at {:?}", path))?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(queries::SCHEMA)
            .context("Failed to apply module database schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection. A poisoned lock is recovered; SQLite keeps its
    /// own consistency.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate the next command id (persisted counter).
    pub fn next_command_id(&self) -> Result<i64> {
        let conn = self.lock();
        conn.execute(queries::BUMP_COUNTER, params!["command_id"])?;
        let id = conn.query_row(queries::SELECT_COUNTER, params!["command_id"], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(id)
    }

    /// Advance a named counter in one immediate transaction. `advance` maps
    /// the stored value (0 when unset) to `(result, new_value)`.
    pub fn advance_counter<F>(&self, name: &str, advance: F) -> Result<i64>
    where
        F: FnOnce(i64) -> (i64, i64),
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = tx
            .query_row(queries::SELECT_COUNTER, params![name], |row| row.get::<_, i64>(0))
            .optional()?
            .unwrap_or(0);
        let (result, next) = advance(current);
        tx.execute(queries::SET_COUNTER, params![name, next])?;
        tx.commit()?;
        Ok(result)
    }
}

//! Database operations split into domain-specific modules.
//!
//! This module re-exports the main Database struct and all its operations.

mod ai_config;
mod helpers;
mod kv;
mod session_state;

pub use session_state::SessionState;

use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::migrations;

/// Database connection wrapper
///
/// The connection sits behind a mutex so every read and every write
/// transaction sees a consistent snapshot of the session layout.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection
    ///
    /// # Errors
    ///
    /// Returns an error if database directory creation, connection opening, or schema initialization fails
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = db_path.unwrap_or_else(Self::default_db_path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(&path).context("Failed to open database connection")?;
        migrations::init_schema(&conn)?;

        log::debug!("Database initialized at: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if schema initialization fails
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrations::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get default database path
    fn default_db_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("hoot");
        path.push("hoot.db");
        path
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))?;
        f(&conn)
    }

    pub(crate) fn with_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Delete all persisted state, including the AI configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    pub fn clear_all(&self) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM kv_state", [])?;
            tx.execute("DELETE FROM ai_config", [])?;
            Ok(())
        })?;
        log::info!("Cleared all persisted state");
        Ok(())
    }
}

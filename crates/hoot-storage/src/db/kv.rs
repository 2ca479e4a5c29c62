//! JSON-encoded key/value access to the `kv_state` table.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

pub const GOAL: &str = "goal";
pub const SESSION_ID: &str = "sessionId";
pub const START_TIME: &str = "startTime";
pub const END_TIME: &str = "endTime";
pub const IS_RUNNING: &str = "isRunning";
pub const ACTIVE_BLOCK_LIST: &str = "activeBlockList";
pub const BLOCK_LIST_ACTIVE: &str = "blockListActive";
pub const LAST_BLOCK: &str = "lastBlock";
pub const LAST_NOTIFICATION: &str = "lastNotification";

/// Read a value; JSON `null` and missing keys both read as `None`
pub fn get_value<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM kv_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(text) => {
            let value: Option<T> = serde_json::from_str(&text)
                .with_context(|| format!("Corrupted value for state key '{key}'"))?;
            Ok(value)
        }
        None => Ok(None),
    }
}

pub fn put_value<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO kv_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
        params![key, text],
    )?;
    Ok(())
}

pub fn remove_values(conn: &Connection, keys: &[&str]) -> Result<()> {
    for key in keys {
        conn.execute("DELETE FROM kv_state WHERE key = ?1", params![key])?;
    }
    Ok(())
}

//! AI Configuration database operations

use anyhow::Result;
use rusqlite::Connection;

use super::Database;
use crate::models::AiConfig;

/// Get AI configuration from database
fn get_ai_config(conn: &Connection) -> Result<AiConfig> {
    let result = conn.query_row(
        "SELECT api_key, model, base_url, max_output_tokens, temperature, enabled
         FROM ai_config WHERE id = 1",
        [],
        |row| {
            Ok(AiConfig {
                api_key: row.get(0)?,
                model: row.get(1)?,
                base_url: row.get(2)?,
                max_output_tokens: row.get(3)?,
                temperature: row.get::<_, f64>(4)? as f32,
                enabled: row.get(5)?,
            })
        },
    );

    match result {
        Ok(config) => Ok(config),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            // Return default config if none exists
            Ok(AiConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Save AI configuration to database
fn save_ai_config(conn: &Connection, config: &AiConfig) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_config (id, api_key, model, base_url, max_output_tokens, temperature, enabled, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
            api_key = excluded.api_key,
            model = excluded.model,
            base_url = excluded.base_url,
            max_output_tokens = excluded.max_output_tokens,
            temperature = excluded.temperature,
            enabled = excluded.enabled,
            updated_at = excluded.updated_at",
        rusqlite::params![
            config.api_key,
            config.model,
            config.base_url,
            config.max_output_tokens,
            f64::from(config.temperature),
            config.enabled,
        ],
    )?;

    Ok(())
}

/// Update a specific AI config field
fn update_ai_config_field(conn: &Connection, key: &str, value: Option<&str>) -> Result<()> {
    // Ensure we have a row to update
    conn.execute(
        "INSERT OR IGNORE INTO ai_config (id, enabled) VALUES (1, 1)",
        [],
    )?;

    match key {
        "api_key" => {
            conn.execute(
                "UPDATE ai_config SET api_key = ?1, updated_at = datetime('now') WHERE id = 1",
                [value],
            )?;
        }
        "model" => {
            conn.execute(
                "UPDATE ai_config SET model = ?1, updated_at = datetime('now') WHERE id = 1",
                [value],
            )?;
        }
        "base_url" => {
            conn.execute(
                "UPDATE ai_config SET base_url = ?1, updated_at = datetime('now') WHERE id = 1",
                [value],
            )?;
        }
        "max_output_tokens" => {
            let tokens: u32 = match value {
                Some(v) => v.parse()?,
                None => crate::models::DEFAULT_MAX_OUTPUT_TOKENS,
            };
            conn.execute(
                "UPDATE ai_config SET max_output_tokens = ?1, updated_at = datetime('now') WHERE id = 1",
                [tokens],
            )?;
        }
        "temperature" => {
            let temperature: f64 = match value {
                Some(v) => v.parse()?,
                None => f64::from(crate::models::DEFAULT_TEMPERATURE),
            };
            if !(0.0..=2.0).contains(&temperature) {
                anyhow::bail!("Temperature must be between 0.0 and 2.0");
            }
            conn.execute(
                "UPDATE ai_config SET temperature = ?1, updated_at = datetime('now') WHERE id = 1",
                [temperature],
            )?;
        }
        "enabled" => {
            let enabled = value.is_some_and(|v| v == "true" || v == "1");
            conn.execute(
                "UPDATE ai_config SET enabled = ?1, updated_at = datetime('now') WHERE id = 1",
                [enabled],
            )?;
        }
        _ => {
            anyhow::bail!("Unknown AI config key: {key}");
        }
    }

    Ok(())
}

impl Database {
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub fn get_ai_config(&self) -> Result<AiConfig> {
        self.with_conn(get_ai_config)
    }

    /// # Errors
    ///
    /// Returns an error if the upsert fails
    pub fn save_ai_config(&self, config: &AiConfig) -> Result<()> {
        self.with_conn(|conn| save_ai_config(conn, config))
    }

    /// # Errors
    ///
    /// Returns an error for unknown keys, unparsable values, or a failed update
    pub fn update_ai_config_field(&self, key: &str, value: Option<&str>) -> Result<()> {
        self.with_conn(|conn| update_ai_config_field(conn, key, value))
    }
}

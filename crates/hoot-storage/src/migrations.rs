use anyhow::Result;
use rusqlite::Connection;

/// Initialize database schema
///
/// # Errors
///
/// Returns an error if database table creation or column migration fails
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Key/value state - mirrors the persisted session layout
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // AI config table - single row with id = 1
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ai_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            api_key TEXT,
            model TEXT,
            base_url TEXT,
            enabled INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT
        )",
        [],
    )?;

    // Columns added after the first release
    let columns_to_add = vec![
        ("max_output_tokens", "INTEGER NOT NULL DEFAULT 1024"),
        ("temperature", "REAL NOT NULL DEFAULT 0.9"),
    ];

    for (column_name, column_type) in columns_to_add {
        let column_exists: Result<i32, rusqlite::Error> = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM pragma_table_info('ai_config') WHERE name='{column_name}'"
            ),
            [],
            |row| row.get(0),
        );

        if column_exists.unwrap_or(0) == 0 {
            conn.execute(
                &format!("ALTER TABLE ai_config ADD COLUMN {column_name} {column_type}"),
                [],
            )?;
            log::info!("Added {column_name} column to ai_config table");
        }
    }

    Ok(())
}

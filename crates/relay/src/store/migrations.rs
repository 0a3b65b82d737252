//! Migration runner for the relational backing.

use rusqlite::Connection;

use crate::error::RelayResult;

/// Embedded migrations, applied in order and recorded by name.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_connections.sql",
    "CREATE TABLE IF NOT EXISTS connections (connection_id TEXT PRIMARY KEY NOT NULL);",
)];

/// Apply every migration not yet recorded in `_schema_migrations`.
pub fn run_migrations(conn: &Connection) -> RelayResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _schema_migrations (name TEXT PRIMARY KEY)",
        [],
    )?;

    for (name, sql) in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT 1 FROM _schema_migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if applied {
            continue;
        }

        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO _schema_migrations (name) VALUES (?1)", [name])?;
        tracing::info!(migration = %name, "applied migration");
    }

    Ok(())
}

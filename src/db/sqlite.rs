use std::path::Path;

use rusqlite::{params, Connection};

use super::DatabaseError;

/// Open (creating if needed) the clinic database at `path`, migrated to the
/// latest schema.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    initialize(Connection::open(path)?)
}

/// Same as [`open_database`] but backed by memory. Used by tests.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    initialize(Connection::open_in_memory()?)
}

/// Foreign keys are off by default in SQLite and are per-connection, so every
/// connection goes through here before it is handed out.
fn initialize(conn: Connection) -> Result<Connection, DatabaseError> {
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA journal_mode=DELETE;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!(version, "Applying schema migration");
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
            tx.commit()?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
pub fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, Option<i64>>(0),
    )
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Number of user tables, `schema_version` included.
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(list_tables(conn)?.len() as i64)
}

/// Names of all user tables, alphabetically.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type='table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Explicitly created indexes on `table` (automatic unique/PK indexes excluded).
pub fn list_indexes(conn: &Connection, table: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type='index' AND tbl_name = ?1 AND sql IS NOT NULL
         ORDER BY name",
    )?;
    let names = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

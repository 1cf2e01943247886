//! Illustrative seed rows for a fresh clinic database.
//!
//! The rows are loaded in a single transaction. A database that already holds
//! any patient is left untouched.

use rusqlite::Connection;
use serde::Serialize;

use super::DatabaseError;

const SEED_SQL: &str = include_str!("../../resources/seed/clinic_seed.sql");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Loaded,
    AlreadySeeded,
}

/// Load the seed rows unless the database already has patients.
pub fn seed_database(conn: &Connection) -> Result<SeedOutcome, DatabaseError> {
    let patients: i64 = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    if patients > 0 {
        tracing::info!(patients, "Seed skipped, database already populated");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(SEED_SQL)?;
    tx.commit()?;

    tracing::info!("Seed data loaded");
    Ok(SeedOutcome::Loaded)
}

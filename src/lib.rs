//! Clinic administrative records on SQLite: patients, doctors, appointments,
//! prescriptions, billing and payments.
//!
//! The schema (constraints, delete policies, index) lives in versioned SQL
//! migrations and is enforced by SQLite itself. This crate opens and migrates
//! the database, loads seed rows, and offers typed per-entity repository
//! functions plus a billing drift checker.

pub mod config;
pub mod db;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

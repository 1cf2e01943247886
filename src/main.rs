use std::process::ExitCode;

use clinic_records::config;
use clinic_records::db::seed::seed_database;
use clinic_records::db::{check_consistency, count_tables, open_database, repair_consistency, DatabaseError};
use serde::Serialize;

const USAGE: &str = "usage: clinic-records [check | seed | repair]";

#[derive(Serialize)]
struct Summary<'a> {
    database: String,
    tables: i64,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<clinic_records::db::seed::SeedOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repaired: Option<usize>,
    consistency: clinic_records::db::ConsistencyReport,
}

fn main() -> ExitCode {
    clinic_records::init_tracing();

    let action = std::env::args().nth(1).unwrap_or_else(|| "check".into());
    if !matches!(action.as_str(), "check" | "seed" | "repair") {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    match run(&action) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "clinic-records failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the database ended up free of consistency issues.
fn run(action: &str) -> Result<bool, DatabaseError> {
    let path = config::database_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!(path = %path.display(), version = config::APP_VERSION, "Opening clinic database");
    let conn = open_database(&path)?;

    let seed = match action {
        "seed" => Some(seed_database(&conn)?),
        _ => None,
    };
    let repaired = match action {
        "repair" => Some(repair_consistency(&conn)?),
        _ => None,
    };

    let summary = Summary {
        database: path.display().to_string(),
        tables: count_tables(&conn)?,
        action,
        seed,
        repaired,
        consistency: check_consistency(&conn)?,
    };
    let clean = summary.consistency.is_clean();

    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    Ok(clean)
}

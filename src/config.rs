use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ClinicRecords";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the database location.
pub const DB_PATH_ENV: &str = "CLINIC_DB_PATH";

/// Get the application data directory
/// Platform data dir (e.g. ~/.local/share/ClinicRecords), or ./ClinicRecords
/// when the platform reports none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the database file path, honouring `CLINIC_DB_PATH`.
pub fn database_path() -> PathBuf {
    database_path_from(std::env::var_os(DB_PATH_ENV).map(PathBuf::from))
}

fn database_path_from(override_path: Option<PathBuf>) -> PathBuf {
    override_path
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| app_data_dir().join("clinic.db"))
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinic_records=info"
}

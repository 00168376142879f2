mod config;
pub mod database;
pub mod migrations;
mod store;

pub use config::{Config, LogConfig, PomodoroConfig, StorageConfig, StreaksConfig};
pub use database::Database;
pub use store::{StreakRecord, StreakStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable that overrides the data directory outright.
pub const DATA_DIR_ENV: &str = "LEMONSTUDYS_DATA_DIR";

/// Returns the data directory, creating it if needed.
///
/// `LEMONSTUDYS_DATA_DIR` wins if set. Otherwise `~/.config/lemonstudys/`,
/// or `~/.config/lemonstudys-dev/` when `LEMONSTUDYS_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("LEMONSTUDYS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lemonstudys-dev")
            } else {
                base_dir.join("lemonstudys")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

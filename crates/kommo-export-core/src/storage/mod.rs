mod config;
pub mod database;
pub mod migrations;
pub mod rows;

pub use config::{AuthConfig, Config, DatabaseConfig, ExportConfig, KommoConfig, TokenStoreKind};
pub use database::{ExportDb, UpsertSink};
pub use rows::Upsert;

use std::path::PathBuf;

/// Returns `~/.config/kommo-export[-dev]/` based on KOMMO_EXPORT_ENV.
///
/// Set KOMMO_EXPORT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("KOMMO_EXPORT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("kommo-export-dev")
    } else {
        base_dir.join("kommo-export")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

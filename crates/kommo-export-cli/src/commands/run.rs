use std::path::Path;

use kommo_export_core::run_from_config;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let summary = run_from_config(&config)?;
    println!("{summary}");
    Ok(())
}

use std::path::Path;

use clap::Subcommand;

use super::{config_path, load_config};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "kommo.subdomain", "export.batch_size")
        key: String,
    },
    /// List all config values, secrets masked
    List,
    /// Print the config file location
    Path,
    /// Check that a run has everything it needs
    Check,
}

pub fn run(action: ConfigAction, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(path)?.redacted();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::List => {
            let config = load_config(path)?.redacted();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Path => {
            println!("{}", config_path(path)?.display());
        }
        ConfigAction::Check => {
            load_config(path)?.validate()?;
            println!("ok");
        }
    }
    Ok(())
}

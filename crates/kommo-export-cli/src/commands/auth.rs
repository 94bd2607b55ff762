use std::path::Path;

use chrono::DateTime;
use clap::Subcommand;
use kommo_export_core::auth;

use super::load_config;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a refresh token obtained from the integration settings
    Login {
        /// OAuth refresh token
        #[arg(long)]
        refresh_token: String,
    },
    /// Check stored credentials
    Status,
}

pub fn run(action: AuthAction, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let Some(store) = auth::token_store_from_config(&config)? else {
        return static_token(action, config.auth.access_token.is_some());
    };

    match action {
        AuthAction::Login { refresh_token } => {
            let location = store.location();
            auth::token_manager(&config, store)?.seed_refresh_token(&refresh_token)?;
            println!("refresh token stored in {location}");
        }
        AuthAction::Status => match store.load()? {
            None => println!("not authenticated ({})", store.location()),
            Some(tokens) => {
                let expiry = tokens
                    .expires_at
                    .and_then(|ts| DateTime::from_timestamp(ts, 0))
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| "never".into());
                let state = if tokens.is_expired() {
                    "expired"
                } else {
                    "valid"
                };
                println!("authenticated ({})", store.location());
                println!("access token: {state}, expires {expiry}");
                println!(
                    "refresh token: {}",
                    if tokens.refresh_token.is_some() {
                        "present"
                    } else {
                        "missing"
                    }
                );
            }
        },
    }
    Ok(())
}

/// `auth.token_store = "static"`: nothing is stored, the token lives in config.
fn static_token(action: AuthAction, configured: bool) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { .. } => {
            Err("token_store is \"static\"; set auth.access_token instead".into())
        }
        AuthAction::Status => {
            let state = if configured { "configured" } else { "missing" };
            println!("static access token: {state}");
            Ok(())
        }
    }
}

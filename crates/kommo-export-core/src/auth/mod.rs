//! Bearer credentials for the CRM API.
//!
//! [`TokenManager`] refreshes OAuth tokens through the account's
//! `/oauth2/access_token` endpoint and persists them in a [`TokenStore`].
//! [`StaticCredential`] serves a long-lived token as-is.

pub mod manager;
pub mod oauth;
pub mod token_store;

pub use manager::TokenManager;
pub use oauth::{OAuthConfig, OAuthTokens};
pub use token_store::{FileTokenStore, KeyringTokenStore, TokenStore};

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ExportError, OAuthError};
use crate::storage::{Config, TokenStoreKind};

/// Supplies a valid bearer token on demand.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, OAuthError>;
}

/// A fixed token (long-lived integration token, tests).
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Result<String, OAuthError> {
        Ok(self.token.clone())
    }
}

/// Token store selected by `auth.token_store`, or `None` for a static token.
///
/// # Errors
/// Returns an error if the token path cannot be resolved.
pub fn token_store_from_config(
    config: &Config,
) -> Result<Option<Box<dyn TokenStore>>, ExportError> {
    let store: Box<dyn TokenStore> = match config.auth.token_store {
        TokenStoreKind::File => Box::new(FileTokenStore::new(config.token_path()?)),
        TokenStoreKind::Keyring => Box::new(KeyringTokenStore::new(keyring_account(config))),
        TokenStoreKind::Static => return Ok(None),
    };
    Ok(Some(store))
}

/// Keyring account name: the integration id scoped by account subdomain.
fn keyring_account(config: &Config) -> String {
    format!("{}@{}", config.kommo.integration_id, config.kommo.subdomain)
}

/// Credential provider described by `config`.
///
/// # Errors
/// Returns an error if the configuration is incomplete or the HTTP client
/// cannot be built.
pub fn provider_from_config(
    config: &Config,
) -> Result<Arc<dyn CredentialProvider>, ExportError> {
    let Some(store) = token_store_from_config(config)? else {
        let token = config.auth.access_token.clone().unwrap_or_default();
        return Ok(Arc::new(StaticCredential::new(token)));
    };
    Ok(Arc::new(token_manager(config, store)?))
}

/// Refreshing provider over `store`, using the integration credentials in
/// `config`.
///
/// # Errors
/// Returns an error if the base URL cannot be derived or the HTTP client
/// cannot be built.
pub fn token_manager(
    config: &Config,
    store: Box<dyn TokenStore>,
) -> Result<TokenManager, ExportError> {
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.export.request_timeout_secs))
        .build()
        .map_err(OAuthError::Http)?;
    Ok(TokenManager::new(store, config.oauth_config()?, http))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_store_serves_configured_token() {
        let mut config = Config::default();
        config.kommo.subdomain = "acme".into();
        config.auth.token_store = TokenStoreKind::Static;
        config.auth.access_token = Some("long-lived".into());

        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.bearer_token().unwrap(), "long-lived");
    }

    #[test]
    fn file_store_without_tokens_is_not_authenticated() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.kommo.subdomain = "acme".into();
        config.auth.token_path = Some(dir.path().join("token.json"));

        let provider = provider_from_config(&config).unwrap();
        assert!(matches!(
            provider.bearer_token(),
            Err(OAuthError::NotAuthenticated { .. })
        ));
    }
}

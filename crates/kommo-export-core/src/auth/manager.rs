//! Credential provider backed by refreshable OAuth tokens.

use std::sync::Mutex;

use reqwest::blocking::Client;
use tracing::{debug, info};

use super::oauth::{self, OAuthConfig, OAuthTokens};
use super::token_store::TokenStore;
use super::CredentialProvider;
use crate::error::OAuthError;

/// Loads tokens from a [`TokenStore`] once, refreshes them when expired, and
/// writes refreshed tokens back.
///
/// Check-and-refresh runs under one lock so concurrent callers never refresh
/// the same token twice.
pub struct TokenManager {
    store: Box<dyn TokenStore>,
    config: OAuthConfig,
    http: Client,
    cached: Mutex<Option<OAuthTokens>>,
}

impl TokenManager {
    pub fn new(store: Box<dyn TokenStore>, config: OAuthConfig, http: Client) -> Self {
        Self {
            store,
            config,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Seed the store with a refresh token obtained out of band.
    ///
    /// The stored pair is marked expired so the first request refreshes it.
    pub fn seed_refresh_token(&self, refresh: &str) -> Result<(), OAuthError> {
        let tokens = OAuthTokens {
            access_token: String::new(),
            refresh_token: Some(refresh.to_string()),
            expires_at: Some(0),
            token_type: "Bearer".to_string(),
        };
        self.store.save(&tokens)?;
        *self.lock() = Some(tokens);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<OAuthTokens>> {
        self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialProvider for TokenManager {
    fn bearer_token(&self) -> Result<String, OAuthError> {
        let mut cached = self.lock();

        let current = match cached.take() {
            Some(tokens) => tokens,
            None => self.store.load()?.ok_or_else(|| OAuthError::NotAuthenticated {
                location: self.store.location(),
            })?,
        };

        if !current.is_expired() {
            let token = current.access_token.clone();
            *cached = Some(current);
            return Ok(token);
        }

        debug!("access token expired, refreshing");
        let Some(refresh) = current.refresh_token.clone() else {
            *cached = Some(current);
            return Err(OAuthError::TokenRefreshFailed(
                "no refresh token available".into(),
            ));
        };

        let refreshed = match oauth::refresh_token(&self.http, &self.config, &refresh) {
            Ok(tokens) => tokens,
            Err(e) => {
                *cached = Some(current);
                return Err(e);
            }
        };
        // The old refresh token is spent. Cache the new pair before persisting.
        let token = refreshed.access_token.clone();
        *cached = Some(refreshed.clone());
        self.store.save(&refreshed)?;
        info!(store = %self.store.location(), "stored refreshed tokens");
        Ok(token)
    }
}

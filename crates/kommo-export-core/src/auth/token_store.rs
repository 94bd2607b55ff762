//! Durable storage for OAuth tokens.

use std::path::{Path, PathBuf};

use super::oauth::OAuthTokens;
use crate::error::OAuthError;

/// Where refreshed tokens are kept between runs.
pub trait TokenStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<OAuthTokens>, OAuthError>;
    fn save(&self, tokens: &OAuthTokens) -> Result<(), OAuthError>;
    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<OAuthTokens>, OAuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(OAuthError::TokenStore(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| OAuthError::TokenStore(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, tokens: &OAuthTokens) -> Result<(), OAuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OAuthError::TokenStore(format!("{}: {e}", parent.display())))?;
        }
        let data = serde_json::to_string_pretty(tokens)
            .map_err(|e| OAuthError::TokenStore(e.to_string()))?;
        // Replace atomically.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| OAuthError::TokenStore(format!("{}: {e}", self.path.display())))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// OS keyring store, one entry per account.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    const SERVICE: &'static str = "kommo-export";

    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, OAuthError> {
        keyring::Entry::new(Self::SERVICE, &self.account)
            .map_err(|e| OAuthError::TokenStore(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<OAuthTokens>, OAuthError> {
        match self.entry()?.get_password() {
            Ok(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| OAuthError::TokenStore(e.to_string())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(OAuthError::TokenStore(e.to_string())),
        }
    }

    fn save(&self, tokens: &OAuthTokens) -> Result<(), OAuthError> {
        let json =
            serde_json::to_string(tokens).map_err(|e| OAuthError::TokenStore(e.to_string()))?;
        self.entry()?
            .set_password(&json)
            .map_err(|e| OAuthError::TokenStore(e.to_string()))
    }

    fn location(&self) -> String {
        format!("keyring {}/{}", Self::SERVICE, self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trip_and_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));
        assert!(store.load().unwrap().is_none());

        let tokens = OAuthTokens {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(1_900_000_000),
            token_type: "Bearer".into(),
        };
        store.save(&tokens).unwrap();
        assert_eq!(store.load().unwrap(), Some(tokens));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            FileTokenStore::new(path).load(),
            Err(OAuthError::TokenStore(_))
        ));
    }
}

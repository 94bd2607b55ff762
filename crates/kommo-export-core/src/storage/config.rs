//! TOML-based exporter configuration.
//!
//! Stores:
//! - CRM account and integration credentials
//! - SQLite database location
//! - Token store selection
//! - Paging and batching sizes
//!
//! Configuration is stored at `~/.config/kommo-export/config.toml` unless
//! `KOMMO_EXPORT_CONFIG` points elsewhere. A handful of environment variables
//! override file values after loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::auth::OAuthConfig;
use crate::error::ConfigError;

const REDACTED: &str = "********";

/// CRM account and integration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KommoConfig {
    /// Account subdomain, `acme` for `https://acme.kommo.com/`.
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub integration_id: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub redirect_url: String,
    /// Full base URL, overriding the one derived from `subdomain`.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data_dir>/kommo.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Where bearer credentials come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// Refreshable OAuth tokens in a JSON file.
    #[default]
    File,
    /// Refreshable OAuth tokens in the OS keyring.
    Keyring,
    /// Long-lived token from `auth.access_token`, never refreshed.
    Static,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_store: TokenStoreKind,
    /// Token file for the `file` store. Defaults to `<data_dir>/token.json`.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Paging and batching knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_event_batch_size")]
    pub event_batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kommo: KommoConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

// Default functions
fn default_page_size() -> u32 {
    250
}
fn default_batch_size() -> usize {
    100
}
fn default_event_batch_size() -> usize {
    50
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            batch_size: default_batch_size(),
            event_batch_size: default_event_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Config file location: `KOMMO_EXPORT_CONFIG` or `<data_dir>/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("KOMMO_EXPORT_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/kommo-export"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location and apply environment overrides.
    ///
    /// # Errors
    ///
    /// See [`Config::load_from`].
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::load_from(&Self::path()?)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load `path`, writing a default template there if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("KOMMO_URL_BASE") {
            self.kommo.subdomain = v;
        }
        if let Some(v) = get("KOMMO_INTEGRATION_ID") {
            self.kommo.integration_id = v;
        }
        if let Some(v) = get("KOMMO_SECRET_KEY") {
            self.kommo.secret_key = v;
        }
        if let Some(v) = get("KOMMO_REDIRECT_URL") {
            self.kommo.redirect_url = v;
        }
        if let Some(v) = get("KOMMO_BASE_URL") {
            self.kommo.base_url = Some(v);
        }
        if let Some(v) = get("KOMMO_DB_PATH") {
            self.database.path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("KOMMO_ACCESS_TOKEN") {
            self.auth.access_token = Some(v);
        }
    }

    /// Check that everything an export run needs is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing key, or an invalid paging value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kommo.subdomain.is_empty() && self.kommo.base_url.is_none() {
            return Err(ConfigError::MissingKey("kommo.subdomain".into()));
        }
        match self.auth.token_store {
            TokenStoreKind::Static => {
                if self.auth.access_token.as_deref().unwrap_or("").is_empty() {
                    return Err(ConfigError::MissingKey("auth.access_token".into()));
                }
            }
            TokenStoreKind::File | TokenStoreKind::Keyring => {
                for (key, value) in [
                    ("kommo.integration_id", &self.kommo.integration_id),
                    ("kommo.secret_key", &self.kommo.secret_key),
                    ("kommo.redirect_url", &self.kommo.redirect_url),
                ] {
                    if value.is_empty() {
                        return Err(ConfigError::MissingKey(key.into()));
                    }
                }
            }
        }
        for (key, value) in [
            ("export.page_size", self.export.page_size as usize),
            ("export.batch_size", self.export.batch_size),
            ("export.event_batch_size", self.export.event_batch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    /// Account base URL with a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `base_url` nor `subdomain` is set.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let url = match &self.kommo.base_url {
            Some(url) => url.clone(),
            None if !self.kommo.subdomain.is_empty() => {
                format!("https://{}.kommo.com/", self.kommo.subdomain)
            }
            None => return Err(ConfigError::MissingKey("kommo.subdomain".into())),
        };
        Ok(if url.ends_with('/') { url } else { format!("{url}/") })
    }

    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Self::in_data_dir("kommo.db"),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.auth.token_path {
            Some(path) => Ok(path.clone()),
            None => Self::in_data_dir("token.json"),
        }
    }

    fn in_data_dir(file: &str) -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join(file))
            .map_err(|e| ConfigError::InvalidValue {
                key: "data_dir".into(),
                message: e.to_string(),
            })
    }

    /// Integration credentials for the refresh grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be derived.
    pub fn oauth_config(&self) -> Result<OAuthConfig, ConfigError> {
        Ok(OAuthConfig {
            client_id: self.kommo.integration_id.clone(),
            client_secret: self.kommo.secret_key.clone(),
            redirect_uri: self.kommo.redirect_url.clone(),
            base_url: self.base_url()?,
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if !cfg.kommo.secret_key.is_empty() {
            cfg.kommo.secret_key = REDACTED.into();
        }
        if cfg.auth.access_token.is_some() {
            cfg.auth.access_token = Some(REDACTED.into());
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn complete() -> Config {
        let mut cfg = Config::default();
        cfg.kommo.subdomain = "acme".into();
        cfg.kommo.integration_id = "id".into();
        cfg.kommo.secret_key = "secret".into();
        cfg.kommo.redirect_url = "https://example.com/cb".into();
        cfg
    }

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.export.page_size, 250);
        assert_eq!(parsed.export.batch_size, 100);
        assert_eq!(parsed.export.event_batch_size, 50);
        assert_eq!(parsed.auth.token_store, TokenStoreKind::File);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [kommo]
            subdomain = "acme"

            [auth]
            token_store = "keyring"

            [export]
            batch_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.kommo.subdomain, "acme");
        assert_eq!(cfg.auth.token_store, TokenStoreKind::Keyring);
        assert_eq!(cfg.export.batch_size, 10);
        assert_eq!(cfg.export.page_size, 250);
    }

    #[test]
    fn load_from_missing_writes_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.export.request_timeout_secs, 30);
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[kommo\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("KOMMO_URL_BASE", "beta"),
            ("KOMMO_SECRET_KEY", "from-env"),
            ("KOMMO_DB_PATH", "/tmp/x.db"),
            ("KOMMO_INTEGRATION_ID", ""),
        ]
        .into_iter()
        .collect();
        let mut cfg = complete();
        cfg.apply_env_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.kommo.subdomain, "beta");
        assert_eq!(cfg.kommo.secret_key, "from-env");
        assert_eq!(cfg.kommo.integration_id, "id");
        assert_eq!(cfg.database.path, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn validate_reports_first_missing_key() {
        assert!(complete().validate().is_ok());

        let mut cfg = complete();
        cfg.kommo.secret_key.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingKey(k)) if k == "kommo.secret_key"
        ));

        let mut cfg = Config::default();
        cfg.auth.token_store = TokenStoreKind::Static;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingKey(k)) if k == "kommo.subdomain"
        ));
        cfg.kommo.subdomain = "acme".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingKey(k)) if k == "auth.access_token"
        ));
        cfg.auth.access_token = Some("t".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut cfg = complete();
        cfg.export.batch_size = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "export.batch_size"
        ));
    }

    #[test]
    fn base_url_from_subdomain_or_override() {
        assert_eq!(complete().base_url().unwrap(), "https://acme.kommo.com/");

        let mut cfg = complete();
        cfg.kommo.base_url = Some("http://127.0.0.1:1234".into());
        assert_eq!(cfg.base_url().unwrap(), "http://127.0.0.1:1234/");

        assert!(Config::default().base_url().is_err());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = complete();
        assert_eq!(cfg.get("kommo.subdomain").as_deref(), Some("acme"));
        assert_eq!(cfg.get("export.page_size").as_deref(), Some("250"));
        assert_eq!(cfg.get("auth.token_store").as_deref(), Some("file"));
        assert!(cfg.get("kommo.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn redacted_masks_secrets_only() {
        let mut cfg = complete();
        cfg.auth.access_token = Some("tok".into());
        let shown = cfg.redacted();
        assert_eq!(shown.kommo.secret_key, REDACTED);
        assert_eq!(shown.auth.access_token.as_deref(), Some(REDACTED));
        assert_eq!(shown.kommo.integration_id, "id");
    }
}

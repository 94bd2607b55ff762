//! Core error types for kommo-export-core.
//!
//! Each concern (HTTP transport, wire decoding, storage, credentials,
//! configuration) has its own thiserror enum. [`ExportError`] aggregates them
//! and adds the stage context the orchestrator attaches to fatal failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::Stage;

/// Top-level error type for an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Fetching a page from the CRM failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A wire record could not be mapped to a domain record
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Credential errors
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A fatal error raised inside one orchestrator stage
    #[error("{stage} stage failed after {processed} records: {source}")]
    Stage {
        stage: Stage,
        processed: usize,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    /// Wrap `self` with the stage it escaped from.
    pub fn in_stage(self, stage: Stage, processed: usize) -> Self {
        match self {
            already @ ExportError::Stage { .. } => already,
            other => ExportError::Stage {
                stage,
                processed,
                source: Box::new(other),
            },
        }
    }
}

/// Transport-level failures while talking to the CRM API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be read or parsed as JSON
    #[error("Unreadable body for {resource} page {page}: {message}")]
    Body {
        resource: &'static str,
        page: u32,
        message: String,
    },

    /// A 2xx body without the `_embedded.<key>` array
    #[error("Response for {resource} has no _embedded.{key} array")]
    MissingEmbedded {
        resource: &'static str,
        key: &'static str,
    },
}

/// Failures mapping wire JSON to domain records.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Required field is absent or null
    #[error("{resource}: missing required field '{field}'")]
    MissingField {
        resource: &'static str,
        field: String,
    },

    /// Field is present but has the wrong shape
    #[error("{resource}: invalid field '{field}': {message}")]
    InvalidField {
        resource: &'static str,
        field: String,
        message: String,
    },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Credential errors.
#[derive(Error, Debug)]
pub enum OAuthError {
    /// No stored tokens to start from
    #[error("Not authenticated: no stored tokens in {location}")]
    NotAuthenticated { location: String },

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Reading or writing the token store failed
    #[error("Token store error: {0}")]
    TokenStore(String),

    /// HTTP failure during refresh
    #[error("HTTP error during token refresh: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ExportError {
    fn from(err: rusqlite::Error) -> Self {
        ExportError::Database(err.into())
    }
}

/// Result type alias for ExportError
pub type Result<T, E = ExportError> = std::result::Result<T, E>;

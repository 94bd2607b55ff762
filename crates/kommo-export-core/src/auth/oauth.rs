//! OAuth2 refresh-token grant against the account's token endpoint.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::OAuthError;

/// Seconds of clock skew tolerated before a token counts as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>, // Unix timestamp
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthTokens {
    /// Expired (or within the skew window) at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(exp) => now > exp - EXPIRY_SKEW_SECS,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

/// Integration credentials registered in the CRM account.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Account base URL; the token endpoint is `<base>/oauth2/access_token`.
    pub base_url: String,
}

impl OAuthConfig {
    pub fn token_url(&self) -> Result<Url, OAuthError> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join("oauth2/access_token"))
            .map_err(|e| OAuthError::TokenRefreshFailed(format!("invalid base URL: {e}")))
    }
}

/// Exchange a refresh token for a new token pair.
///
/// The API may rotate the refresh token; when it does not return one, the
/// old refresh token is kept.
pub fn refresh_token(
    http: &Client,
    config: &OAuthConfig,
    refresh: &str,
) -> Result<OAuthTokens, OAuthError> {
    let body = json!({
        "client_id": config.client_id,
        "client_secret": config.client_secret,
        "grant_type": "refresh_token",
        "refresh_token": refresh,
        "redirect_uri": config.redirect_uri,
    });

    let resp = http
        .post(config.token_url()?)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().unwrap_or_default();
        return Err(OAuthError::TokenRefreshFailed(format!(
            "HTTP {status}: {text}"
        )));
    }

    let body: serde_json::Value = resp.json()?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| OAuthError::TokenRefreshFailed("missing access_token".into()))?
        .to_string();

    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    let expires_at = expires_in.map(|ei| chrono::Utc::now().timestamp() + ei);

    info!(expires_at, "refreshed access token");

    Ok(OAuthTokens {
        access_token,
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| Some(refresh.to_string())),
        expires_at,
        token_type: body["token_type"]
            .as_str()
            .unwrap_or("Bearer")
            .to_string(),
    })
}

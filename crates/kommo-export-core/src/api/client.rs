//! Blocking HTTP client for the CRM REST API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::resource::Resource;
use crate::auth::CredentialProvider;
use crate::error::{ApiError, ConfigError, Result};

/// Something that can return the raw records of one page of a resource.
///
/// An empty vector means the resource is exhausted.
pub trait PageSource {
    fn fetch_page(&self, resource: Resource, page: u32, limit: u32) -> Result<Vec<Value>>;
}

/// CRM API client. Every request reads the bearer token from the injected
/// credential provider.
pub struct KommoClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl KommoClient {
    /// Build a client for `base_url` (e.g. `https://acme.kommo.com/`).
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "kommo.base_url".into(),
            message: e.to_string(),
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Network)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, resource: Resource) -> Result<Url> {
        self.base_url
            .join(resource.path())
            .map_err(|e| {
                ConfigError::InvalidValue {
                    key: "kommo.base_url".into(),
                    message: e.to_string(),
                }
                .into()
            })
    }
}

impl PageSource for KommoClient {
    fn fetch_page(&self, resource: Resource, page: u32, limit: u32) -> Result<Vec<Value>> {
        let token = self.credentials.bearer_token()?;
        let url = self.endpoint(resource)?;

        let mut query = vec![
            ("limit", limit.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(with) = resource.with_param() {
            query.push(("with", with.to_string()));
        }

        let resp = self
            .http
            .get(url)
            .query(&query)
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .send()
            .map_err(ApiError::Network)?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            debug!(%resource, page, "no content");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            warn!(%resource, page, %status, "non-success page response, treating as last page");
            return Ok(Vec::new());
        }

        let body = resp.bytes().map_err(ApiError::Network)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!(%resource, page, "empty body");
            return Ok(Vec::new());
        }

        let mut json: Value = serde_json::from_slice(&body).map_err(|e| ApiError::Body {
            resource: resource.name(),
            page,
            message: e.to_string(),
        })?;

        let key = resource.embedded_key();
        match json
            .get_mut("_embedded")
            .and_then(|e| e.get_mut(key))
            .map(Value::take)
        {
            Some(Value::Array(records)) => {
                debug!(%resource, page, count = records.len(), "fetched page");
                Ok(records)
            }
            _ => Err(ApiError::MissingEmbedded {
                resource: resource.name(),
                key,
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredential;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> KommoClient {
        KommoClient::new(
            &format!("{}/", server.url()),
            Arc::new(StaticCredential::new("test-token")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn sends_bearer_and_paging_params() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v4/leads")
            .match_header("authorization", "Bearer test-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "250".into()),
                Matcher::UrlEncoded("with".into(), "loss_reason,contacts".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"_embedded":{"leads":[{"id":1},{"id":2}]}}"#)
            .create();

        let records = client(&server).fetch_page(Resource::Leads, 2, 250).unwrap();
        assert_eq!(records.len(), 2);
        mock.assert();
    }

    #[test]
    fn no_content_and_errors_fold_into_exhaustion() {
        let mut server = mockito::Server::new();
        let _tasks = server
            .mock("GET", "/api/v4/tasks")
            .match_query(Matcher::Any)
            .with_status(204)
            .create();
        let _events = server
            .mock("GET", "/api/v4/events")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("not found")
            .create();
        let _contacts = server
            .mock("GET", "/api/v4/contacts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("")
            .create();

        let c = client(&server);
        assert!(c.fetch_page(Resource::Tasks, 1, 250).unwrap().is_empty());
        assert!(c.fetch_page(Resource::Events, 1, 250).unwrap().is_empty());
        assert!(c.fetch_page(Resource::Contacts, 1, 250).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_fatal() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/api/v4/users")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{not json")
            .create();

        let err = client(&server)
            .fetch_page(Resource::Users, 1, 250)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ExportError::Api(ApiError::Body { page: 1, .. })
        ));
    }

    #[test]
    fn missing_embedded_array_is_fatal() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/api/v4/companies")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"_page":1}"#)
            .create();

        let err = client(&server)
            .fetch_page(Resource::Companies, 1, 250)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::ExportError::Api(ApiError::MissingEmbedded { key: "companies", .. })
        ));
    }
}

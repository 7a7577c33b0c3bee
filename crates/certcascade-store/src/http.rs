//! REST adapter for a CredHub-compatible credential store.
//!
//! - `GET  {api}/api/v1/certificates?name=<name>` lists the certificates a CA signs.
//! - `POST {api}/api/v1/regenerate` with `{"name": <name>}` rotates one credential.
//!
//! The adapter is handed an already-issued bearer token; obtaining and
//! refreshing it is the caller's concern.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{CredentialVersion, StoreClient};

/// Connection settings for [`HttpStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the store API, e.g. `https://credhub.example.com:8844`.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    /// Accept any server certificate.
    pub skip_tls_validation: bool,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            token: None,
            timeout: Duration::from_secs(30),
            skip_tls_validation: false,
        }
    }
}

/// HTTP-backed [`StoreClient`].
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CertificatesResponse {
    #[serde(default)]
    certificates: Vec<CertificateMetadata>,
}

#[derive(Debug, Deserialize)]
struct CertificateMetadata {
    name: String,
    #[serde(default)]
    signs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RegenerateRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegenerateResponse {
    id: String,
    name: String,
    #[serde(default)]
    version_created_at: Option<String>,
}

impl HttpStore {
    /// Build a client from configuration.
    pub fn new(config: HttpStoreConfig) -> Result<Self> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::InvalidConfig("api url is required".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(StoreError::InvalidConfig(format!(
                "api url must start with http:// or https://: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_tls_validation)
            .build()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: config.token,
        })
    }

    /// The normalized API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl StoreClient for HttpStore {
    async fn list_signed_by(&self, name: &str) -> Result<Vec<String>> {
        let url = format!("{}/api/v1/certificates", self.base_url);
        debug!(%url, name, "listing signed certificates");

        let response = self
            .authorize(self.client.get(&url).query(&[("name", name)]))
            .send()
            .await
            .map_err(|e| transport_error(name, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(name, e))?;
        if !status.is_success() {
            return Err(status_error(status, name, &body));
        }

        decode_signs(name, &body)
    }

    async fn regenerate(&self, name: &str) -> Result<CredentialVersion> {
        let url = format!("{}/api/v1/regenerate", self.base_url);
        debug!(%url, name, "regenerating certificate");

        let response = self
            .authorize(self.client.post(&url).json(&RegenerateRequest { name }))
            .send()
            .await
            .map_err(|e| transport_error(name, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(name, e))?;
        if !status.is_success() {
            return Err(status_error(status, name, &body));
        }

        decode_version(&body)
    }
}

/// Extract the `signs` list for `name` from a certificates response.
fn decode_signs(name: &str, body: &str) -> Result<Vec<String>> {
    let response: CertificatesResponse =
        serde_json::from_str(body).map_err(|e| StoreError::Protocol(e.to_string()))?;

    response
        .certificates
        .into_iter()
        .find(|cert| response_name_matches(&cert.name, name))
        .map(|cert| cert.signs)
        .ok_or_else(|| StoreError::NotFound(name.to_string()))
}

/// The store normalizes names with a leading slash.
fn response_name_matches(stored: &str, requested: &str) -> bool {
    stored.trim_start_matches('/') == requested.trim_start_matches('/')
}

fn decode_version(body: &str) -> Result<CredentialVersion> {
    let response: RegenerateResponse =
        serde_json::from_str(body).map_err(|e| StoreError::Protocol(e.to_string()))?;

    Ok(CredentialVersion {
        name: response.name,
        version_id: response.id,
        created_at: response.version_created_at,
    })
}

/// Map a non-success HTTP status onto the store error taxonomy.
fn status_error(status: StatusCode, name: &str, body: &str) -> StoreError {
    let message = server_message(body).unwrap_or_else(|| format!("{} ({})", name, status));
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StoreError::Timeout(message),
        _ => StoreError::Network(message),
    }
}

/// Pull the `error` field out of a JSON error body, if present.
fn server_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
}

fn transport_error(name: &str, error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::Timeout(format!("{}: {}", name, error))
    } else if error.is_decode() {
        StoreError::Protocol(format!("{}: {}", name, error))
    } else {
        StoreError::Network(format!("{}: {}", name, error))
    }
}

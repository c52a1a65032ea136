//! The DNS API client.

use crate::error::{ApiError, Result};
use crate::types::{ApiZone, RrsetUpdate, ZoneCreate, ZoneSummary};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;
use zonebridge_model::strip_trailing_dot;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default server id in the API path.
const DEFAULT_SERVER_ID: &str = "localhost";

/// Longest request/response body fragment written to the debug log.
const LOG_BODY_LIMIT: usize = 512;

/// Client for the remote DNS server's zone management API.
///
/// Cheap to clone; the underlying HTTP client reuses connections and is
/// safe to share across concurrent zone syncs.
#[derive(Clone)]
pub struct DnsApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base: Url,
    api_key: String,
    server_id: String,
}

impl DnsApiClient {
    /// Creates a client with default settings.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        Self::builder(base_url, api_key).build()
    }

    /// Creates a builder for custom configuration.
    pub fn builder(base_url: impl AsRef<str>, api_key: impl Into<String>) -> DnsApiClientBuilder {
        DnsApiClientBuilder::new(base_url, api_key)
    }

    /// Lists all zones the server hosts.
    pub async fn list_zones(&self) -> Result<Vec<ZoneSummary>> {
        self.get_json(&self.zones_path()).await
    }

    /// Fetches one zone with its full RRset list.
    pub async fn get_zone(&self, zone: &str) -> Result<ApiZone> {
        self.get_json(&self.zone_path(zone)).await
    }

    /// Creates a zone.
    ///
    /// A conflict response surfaces as [`ApiError::Conflict`]; callers
    /// that want create-if-missing semantics treat it as success.
    pub async fn create_zone(&self, payload: &ZoneCreate) -> Result<ApiZone> {
        let path = self.zones_path();
        let body = serde_json::to_string(payload)?;
        debug!(method = "POST", path = %path, body = %truncate_for_log(&body), "API request");

        let request = self
            .request(Method::POST, &path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.send_json(request, &path).await
    }

    /// Applies a bulk RRset update to a zone.
    pub async fn patch_zone(&self, zone: &str, update: &RrsetUpdate) -> Result<()> {
        let path = self.zone_path(zone);
        let body = serde_json::to_string(update)?;
        debug!(method = "PATCH", path = %path, body = %truncate_for_log(&body), "API request");

        let request = self
            .request(Method::PATCH, &path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.send_empty(request, &path).await
    }

    /// Deletes a zone.
    pub async fn delete_zone(&self, zone: &str) -> Result<()> {
        let path = self.zone_path(zone);
        debug!(method = "DELETE", path = %path, "API request");

        let request = self.request(Method::DELETE, &path);
        self.send_empty(request, &path).await
    }

    fn zones_path(&self) -> String {
        format!("/api/v1/servers/{}/zones", self.inner.server_id)
    }

    fn zone_path(&self, zone: &str) -> String {
        // Zone ids in URLs are spelled without the trailing dot.
        format!("{}/{}", self.zones_path(), strip_trailing_dot(zone))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.inner.base.join(path.trim_start_matches('/')).unwrap_or_else(|_| {
            // The base URL was validated at build time; a join can only
            // fail on a malformed path, which we construct ourselves.
            self.inner.base.clone()
        });
        self.inner
            .http
            .request(method, url)
            .header("X-API-Key", &self.inner.api_key)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(method = "GET", path = %path, "API request");
        let request = self.request(Method::GET, path);
        self.send_json(request, path).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, path: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        debug!(path = %path, status = %status, body = %truncate_for_log(&body), "API response");

        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(classify_error(status, &body))
        }
    }

    async fn send_empty(&self, request: RequestBuilder, path: &str) -> Result<()> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        debug!(path = %path, status = %status, body = %truncate_for_log(&body), "API response");

        if status.is_success() {
            Ok(())
        } else {
            Err(classify_error(status, &body))
        }
    }
}

/// Maps a non-2xx response to the error taxonomy.
fn classify_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string());

    match status.as_u16() {
        401 | 403 => ApiError::Unauthorized,
        404 => ApiError::NotFound { resource: message },
        409 => ApiError::Conflict { message },
        422 if message.to_ascii_lowercase().contains("already exists") => {
            ApiError::Conflict { message }
        }
        code => ApiError::Api { status: code, message },
    }
}

/// Truncates a body for the debug log.
fn truncate_for_log(body: &str) -> String {
    if body.len() <= LOG_BODY_LIMIT {
        body.to_string()
    } else {
        format!("{}… ({} bytes)", &body[..LOG_BODY_LIMIT], body.len())
    }
}

/// Builder for configuring a [`DnsApiClient`].
pub struct DnsApiClientBuilder {
    base_url: String,
    api_key: String,
    server_id: String,
    timeout: Duration,
}

impl DnsApiClientBuilder {
    /// Creates a builder.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.as_ref().to_string(),
            api_key: api_key.into(),
            server_id: DEFAULT_SERVER_ID.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the server id used in API paths.
    #[must_use]
    pub fn server_id(mut self, id: impl Into<String>) -> Self {
        self.server_id = id.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<DnsApiClient> {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("zonebridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        Ok(DnsApiClient {
            inner: Arc::new(ClientInner {
                http,
                base,
                api_key: self.api_key,
                server_id: self.server_id,
            }),
        })
    }
}

//! Compute Client
//!
//! Scoped connection to the Compute Engine API, combining authentication
//! and HTTP functionality. A client is opened per operation and released
//! when it goes out of scope.

use super::auth::{CredentialSource, GcpCredentials};
use super::http::GcpHttpClient;
use crate::error::{ComputeError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Public Compute Engine endpoint
pub const DEFAULT_ENDPOINT: &str = "https://compute.googleapis.com";

/// Default delay between operation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on waiting for a single operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Explicit per-call configuration for opening a client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub credentials: CredentialSource,
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
    /// `maxResults` sent with list calls (server default when `None`)
    pub page_size: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            credentials: CredentialSource::ApplicationDefault,
            poll_interval: DEFAULT_POLL_INTERVAL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            page_size: None,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `endpoint` with a static bearer token
    pub fn with_static_token(endpoint: &str, token: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ComputeError::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
        Ok(Self {
            endpoint,
            credentials: CredentialSource::Static(token.to_string()),
            ..Self::default()
        })
    }
}

/// Open connection to the Compute Engine API
pub struct ComputeClient {
    credentials: GcpCredentials,
    http: GcpHttpClient,
    base_url: String,
    session: Uuid,
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
    pub page_size: Option<u32>,
}

impl ComputeClient {
    /// Open a new client
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        let credentials = GcpCredentials::new(&config.credentials).await?;
        let http = GcpHttpClient::new()?;
        let session = Uuid::new_v4();

        tracing::debug!(%session, "Compute client opened against {}", config.endpoint);

        Ok(Self {
            credentials,
            http,
            base_url: config.endpoint.as_str().trim_end_matches('/').to_string(),
            session,
            poll_interval: config.poll_interval,
            operation_timeout: config.operation_timeout,
            page_size: config.page_size,
        })
    }

    /// Release the client
    pub fn close(self) {}

    /// Make a GET request to the Compute API
    pub async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let token = self.credentials.get_token().await?;
        self.http.get(url, &token, query).await
    }

    /// Make a POST request to the Compute API
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.credentials.get_token().await?;
        self.http.post(url, &token, body, query).await
    }

    /// Make a DELETE request to the Compute API
    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.credentials.get_token().await?;
        self.http.delete(url, &token).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, project: &str, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.base_url,
            urlencoding::encode(project),
            path
        )
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, project: &str, zone: &str, resource: &str) -> String {
        self.compute_url(
            project,
            &format!("zones/{}/{}", urlencoding::encode(zone), resource),
        )
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, project: &str, region: &str, resource: &str) -> String {
        self.compute_url(
            project,
            &format!("regions/{}/{}", urlencoding::encode(region), resource),
        )
    }

    /// Build global Compute Engine API URL
    pub fn compute_global_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("global/{}", resource))
    }

    /// Build aggregated Compute Engine API URL (all zones)
    pub fn compute_aggregated_url(&self, project: &str, resource: &str) -> String {
        self.compute_url(project, &format!("aggregated/{}", resource))
    }
}

impl Drop for ComputeClient {
    fn drop(&mut self) {
        tracing::debug!(session = %self.session, "Compute client released");
    }
}

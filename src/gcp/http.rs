//! HTTP utilities for GCP REST API calls

use crate::error::{ComputeError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Turn a non-success response into a `ComputeError::Request`
fn request_error(status: u16, body: &str) -> ComputeError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .first()
                .map(|d| d.reason.clone())
                .filter(|r| !r.is_empty())
                .or(envelope.error.status)
                .unwrap_or_default();
            ComputeError::Request {
                status,
                reason,
                message: envelope.error.message,
            }
        }
        Err(_) => ComputeError::Request {
            status,
            reason: String::new(),
            message: sanitize_for_log(body),
        },
    }
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gce-instances/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ComputeError::Connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("GET {}", url);

        let request = self.client.get(url).bearer_auth(token).query(query);
        let body = Self::execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Make a POST request to a GCP API
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).bearer_auth(token).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response_body = Self::execute(request).await?;
        Ok(serde_json::from_str(&response_body)?)
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        tracing::debug!("DELETE {}", url);

        let request = self.client.delete(url).bearer_auth(token);
        let body = Self::execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request and return the body of a successful response
    async fn execute(request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(request_error(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// Format a Compute API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_gcp_error(error: &ComputeError) -> String {
    match error.status() {
        Some(403) => return "Permission denied. Check your GCP IAM permissions.".to_string(),
        Some(401) => {
            return "Authentication failed. Run 'gcloud auth application-default login'."
                .to_string()
        }
        Some(404) => return "Resource not found.".to_string(),
        Some(409) => {
            return "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(500) | Some(503) => {
            return "GCP service temporarily unavailable. Please try again.".to_string()
        }
        _ => {}
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

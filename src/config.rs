//! Configuration Management
//!
//! Handles persistent configuration storage and turns it into the
//! [`ClientConfig`] each operation is opened with.

use crate::error::{ComputeError, Result};
use crate::gcp::auth::{self, CredentialSource};
use crate::gcp::client::{ClientConfig, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project_id: Option<String>,
    /// Default zone
    #[serde(default)]
    pub zone: Option<String>,
    /// API endpoint override (emulators, private service connect)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Delay between operation polls
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Upper bound on waiting for one operation
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
    /// `maxResults` for list calls
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gce-instances").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; a missing or unreadable file yields defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Result<String> {
        let project = cli
            .map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(auth::get_default_project)
            .ok_or_else(|| {
                ComputeError::Config(
                    "no GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project"
                        .to_string(),
                )
            })?;

        if !auth::validate_project_id(&project) {
            return Err(ComputeError::Config(format!(
                "invalid project ID '{}'",
                project
            )));
        }
        Ok(project)
    }

    /// Get effective zone (CLI > config > gcloud default)
    pub fn effective_zone(&self, cli: Option<&str>) -> Result<String> {
        cli.map(str::to_string)
            .or_else(|| self.zone.clone())
            .or_else(auth::get_default_zone)
            .ok_or_else(|| {
                ComputeError::Config(
                    "no zone configured. Set CLOUDSDK_COMPUTE_ZONE or use --zone".to_string(),
                )
            })
    }

    /// Build the runtime client configuration
    pub fn client_config(
        &self,
        endpoint: Option<&str>,
        access_token: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<ClientConfig> {
        let endpoint = endpoint
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ComputeError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let defaults = ClientConfig::default();
        Ok(ClientConfig {
            endpoint,
            credentials: match access_token {
                Some(token) => CredentialSource::Static(token.to_string()),
                None => CredentialSource::ApplicationDefault,
            },
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            operation_timeout: timeout
                .or(self.operation_timeout_secs.map(Duration::from_secs))
                .unwrap_or(defaults.operation_timeout),
            page_size: self.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("gce-instances-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path();
        let config = Config {
            project_id: Some("my-project-123".to_string()),
            zone: Some("europe-central2-b".to_string()),
            poll_interval_ms: Some(250),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_or_malformed_file_gives_defaults() {
        let path = temp_path();
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            project_id: Some("from-config-1".to_string()),
            zone: Some("us-east1-b".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.effective_project(Some("from-cli-123")).unwrap(),
            "from-cli-123"
        );
        assert_eq!(config.effective_project(None).unwrap(), "from-config-1");
        assert_eq!(config.effective_zone(None).unwrap(), "us-east1-b");
        assert!(config.effective_project(Some("Bad_Project")).is_err());
    }

    #[test]
    fn test_client_config_precedence() {
        let config = Config {
            endpoint: Some("http://localhost:8080".to_string()),
            poll_interval_ms: Some(100),
            operation_timeout_secs: Some(30),
            page_size: Some(50),
            ..Config::default()
        };

        let client = config
            .client_config(None, Some("tok"), Some(Duration::from_secs(5)))
            .unwrap();
        assert_eq!(client.endpoint.as_str(), "http://localhost:8080/");
        assert_eq!(client.credentials, CredentialSource::Static("tok".to_string()));
        assert_eq!(client.poll_interval, Duration::from_millis(100));
        assert_eq!(client.operation_timeout, Duration::from_secs(5));
        assert_eq!(client.page_size, Some(50));

        assert!(config.client_config(Some("::"), None, None).is_err());
    }
}

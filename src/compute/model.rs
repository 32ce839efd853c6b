//! Compute Engine resource models
//!
//! Read-only projections of the JSON returned by the Compute REST API.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

/// Extract short name from a GCP resource URL
/// e.g., "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a" -> "us-central1-a"
pub fn extract_short_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Instance summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub status: String,
}

impl Instance {
    pub fn machine_type_short(&self) -> &str {
        extract_short_name(&self.machine_type)
    }
}

/// One page of `instances.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    #[serde(default)]
    pub items: Vec<Instance>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Informational warning attached to a scoped list (e.g. NO_RESULTS_ON_PAGE)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Instances of one zone inside an aggregated response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InstancesScopedList {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub warning: Option<Warning>,
}

/// One page of `instances.aggregatedList`
///
/// `items` keeps the zone keys in the order they appear in the response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceAggregatedList {
    #[serde(default, deserialize_with = "ordered_entries")]
    pub items: Vec<(String, InstancesScopedList)>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub unreachables: Vec<String>,
}

/// Deserialize a JSON object into its `(key, value)` pairs in document order
fn ordered_entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of scoped lists")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

/// Server-side status of a long-running operation, as sent on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawOperationStatus {
    #[default]
    Pending,
    Running,
    Done,
    #[serde(other)]
    Unknown,
}

/// Observed status of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    /// Finished with errors
    Error(String),
}

impl OperationStatus {
    /// DONE and ERROR are terminal; nothing follows them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Error(_) => "ERROR",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "ERROR: {}", message),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OperationErrorItem {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<OperationErrorItem>,
}

/// Where an operation lives, which decides the URL used to wait on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationScope {
    Zone(String),
    Region(String),
    Global,
}

/// Compute Engine operation resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub status: RawOperationStatus,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub target_link: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
    #[serde(default)]
    pub insert_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub http_error_status_code: Option<u16>,
    #[serde(default)]
    pub http_error_message: Option<String>,
}

impl Operation {
    /// Fold wire status and error payload into a single status
    pub fn status(&self) -> OperationStatus {
        match self.status {
            RawOperationStatus::Pending => OperationStatus::Pending,
            RawOperationStatus::Running => OperationStatus::Running,
            RawOperationStatus::Unknown => {
                tracing::warn!("Unknown status for operation {}", self.name);
                OperationStatus::Running
            }
            RawOperationStatus::Done => match self.error_message() {
                Some(message) => OperationStatus::Error(message),
                None => OperationStatus::Done,
            },
        }
    }

    /// Failure message when the operation carries an error payload or a
    /// failing HTTP status
    pub fn error_message(&self) -> Option<String> {
        let failed_status = self.http_error_status_code.filter(|code| *code >= 400);
        if self.error.is_none() && failed_status.is_none() {
            return None;
        }

        let joined = self
            .error
            .iter()
            .flat_map(|e| &e.errors)
            .map(|e| {
                if e.code.is_empty() {
                    e.message.clone()
                } else {
                    format!("{}: {}", e.code, e.message)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        if !joined.is_empty() {
            return Some(joined);
        }

        let message = self
            .http_error_message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| match failed_status {
                Some(code) => format!("HTTP {}", code),
                None => "operation reported an error".to_string(),
            });
        Some(message)
    }

    pub fn scope(&self) -> OperationScope {
        if let Some(zone) = self.zone.as_deref().filter(|z| !z.is_empty()) {
            OperationScope::Zone(extract_short_name(zone).to_string())
        } else if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            OperationScope::Region(extract_short_name(region).to_string())
        } else {
            OperationScope::Global
        }
    }

    /// Server-side duration, when both timestamps are present
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let start = chrono::DateTime::parse_from_rfc3339(self.insert_time.as_deref()?).ok()?;
        let end = chrono::DateTime::parse_from_rfc3339(self.end_time.as_deref()?).ok()?;
        Some(end - start)
    }
}

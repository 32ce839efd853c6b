//! Request values
//!
//! Immutable descriptions of the calls made against the instances API.
//! Building a request has no side effects.

use crate::error::{ComputeError, Result};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Boot disk size used when the caller does not pick one
pub const DEFAULT_DISK_SIZE_GB: u64 = 10;

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ComputeError::Config(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Create an instance from a source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertInstanceRequest {
    pub project: String,
    pub zone: String,
    pub name: String,
    /// Short machine type (`n1-standard-1`) or a full/partial URL
    pub machine_type: String,
    pub source_image: String,
    pub network: String,
    pub disk_size_gb: u64,
}

impl InsertInstanceRequest {
    pub fn new(
        project: &str,
        zone: &str,
        name: &str,
        machine_type: &str,
        source_image: &str,
        network: &str,
    ) -> Self {
        Self {
            project: project.to_string(),
            zone: zone.to_string(),
            name: name.to_string(),
            machine_type: machine_type.to_string(),
            source_image: source_image.to_string(),
            network: network.to_string(),
            disk_size_gb: DEFAULT_DISK_SIZE_GB,
        }
    }

    pub fn with_disk_size_gb(mut self, disk_size_gb: u64) -> Self {
        self.disk_size_gb = disk_size_gb;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("project", &self.project)?;
        require("zone", &self.zone)?;
        require("instance name", &self.name)?;
        require("machine type", &self.machine_type)?;
        require("source image", &self.source_image)?;
        require("network", &self.network)
    }

    /// Machine type as the API expects it: `zones/{zone}/machineTypes/{type}`
    pub fn machine_type_url(&self) -> String {
        if self.machine_type.contains('/') {
            self.machine_type.clone()
        } else {
            format!("zones/{}/machineTypes/{}", self.zone, self.machine_type)
        }
    }

    /// JSON body of `instances.insert`
    pub fn body(&self) -> Result<Value> {
        let resource = InstanceResource {
            name: &self.name,
            machine_type: self.machine_type_url(),
            disks: vec![AttachedDisk {
                initialize_params: AttachedDiskInitializeParams {
                    // int64 fields travel as strings
                    disk_size_gb: self.disk_size_gb.to_string(),
                    source_image: &self.source_image,
                },
                auto_delete: true,
                boot: true,
                kind: "PERSISTENT",
            }],
            network_interfaces: vec![NetworkInterface {
                network: &self.network,
            }],
        };

        Ok(serde_json::to_value(resource)?)
    }

    /// Query for one insert call; each call gets a fresh `requestId` so the
    /// server only de-duplicates retries of that call
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![("requestId", Uuid::new_v4().to_string())]
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceResource<'a> {
    name: &'a str,
    machine_type: String,
    disks: Vec<AttachedDisk<'a>>,
    network_interfaces: Vec<NetworkInterface<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachedDisk<'a> {
    initialize_params: AttachedDiskInitializeParams<'a>,
    auto_delete: bool,
    boot: bool,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachedDiskInitializeParams<'a> {
    disk_size_gb: String,
    source_image: &'a str,
}

#[derive(Serialize)]
struct NetworkInterface<'a> {
    network: &'a str,
}

/// Delete an existing instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteInstanceRequest {
    pub project: String,
    pub zone: String,
    pub name: String,
}

impl DeleteInstanceRequest {
    pub fn new(project: &str, zone: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            zone: zone.to_string(),
            name: name.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("project", &self.project)?;
        require("zone", &self.zone)?;
        require("instance name", &self.name)
    }
}

/// List instances of one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListInstancesRequest {
    pub project: String,
    pub zone: String,
    pub filter: Option<String>,
}

impl ListInstancesRequest {
    pub fn new(project: &str, zone: &str) -> Self {
        Self {
            project: project.to_string(),
            zone: zone.to_string(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("project", &self.project)?;
        require("zone", &self.zone)
    }
}

/// List instances across every zone of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedListInstancesRequest {
    pub project: String,
    pub filter: Option<String>,
    /// Ask the server to skip unreachable zones instead of failing
    pub return_partial_success: bool,
}

impl AggregatedListInstancesRequest {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            filter: None,
            return_partial_success: false,
        }
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn with_partial_success(mut self, enabled: bool) -> Self {
        self.return_partial_success = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("project", &self.project)
    }
}

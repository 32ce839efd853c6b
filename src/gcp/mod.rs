//! GCP API interaction module
//!
//! Authentication, the HTTP layer, and the scoped Compute client.
//!
//! # Module Structure
//!
//! - [`auth`] - Application Default Credentials, static tokens, gcloud defaults
//! - [`client`] - Scoped Compute Engine client and URL builders
//! - [`http`] - HTTP utilities and API error decoding
//!
//! # Example
//!
//! ```ignore
//! use gce_instances::gcp::client::{ClientConfig, ComputeClient};
//!
//! async fn example() -> gce_instances::Result<()> {
//!     let client = ComputeClient::open(&ClientConfig::default()).await?;
//!     let url = client.compute_zonal_url("my-project", "us-central1-a", "instances");
//!     let _list: serde_json::Value = client.get(&url, &[]).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;

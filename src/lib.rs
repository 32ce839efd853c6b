//! Manage Compute Engine VM instances
//!
//! Create, list, and delete instances through the Compute REST API, and wait
//! on the long-running operations that mutations return. Every entry point
//! takes an explicit [`ClientConfig`], writes its confirmation lines to a
//! caller-supplied [`std::io::Write`], and returns a [`ComputeError`] on
//! failure instead of exiting.
//!
//! ```ignore
//! use gce_instances::{create_instance, ClientConfig, InsertInstanceRequest};
//!
//! async fn example() -> gce_instances::Result<()> {
//!     let config = ClientConfig::default();
//!     let request = InsertInstanceRequest::new(
//!         "my-project",
//!         "europe-central2-b",
//!         "test-instance-name",
//!         "n1-standard-1",
//!         "projects/debian-cloud/global/images/family/debian-10",
//!         "global/networks/default",
//!     );
//!     create_instance(&mut std::io::stdout(), &config, &request).await
//! }
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod gcp;
pub mod report;

pub use compute::{
    create_instance, delete_instance, list_all_instances, list_instances, wait_for_operation,
    AggregatedListInstancesRequest, DeleteInstanceRequest, InsertInstanceRequest, Instances,
    ListInstancesRequest, OperationHandle, OperationStatus, OperationWaiter,
};
pub use error::{ComputeError, Result};
pub use gcp::client::{ClientConfig, ComputeClient};

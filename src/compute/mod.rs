//! Compute Engine instances
//!
//! - [`request`] - immutable request values
//! - [`model`] - instance, list page, and operation models
//! - [`pager`] - lazy cursor pagination (single zone and aggregated)
//! - [`operation`] - waiting on long-running operations
//! - [`instances`] - create, delete, list, and list-all

pub mod instances;
pub mod model;
pub mod operation;
pub mod pager;
pub mod request;

pub use instances::{
    create_instance, delete_instance, list_all_instances, list_instances,
    wait_for_named_operation, Instances,
};
pub use model::{Instance, Operation, OperationStatus};
pub use operation::{wait_for_operation, OperationHandle, OperationWaiter};
pub use request::{
    AggregatedListInstancesRequest, DeleteInstanceRequest, InsertInstanceRequest,
    ListInstancesRequest,
};

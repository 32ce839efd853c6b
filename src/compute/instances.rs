//! Instance operations
//!
//! The free functions open their own client from a [`ClientConfig`], run one
//! operation, and release the client on every exit path. [`Instances`] runs
//! the same operations over a client the caller already holds, which is how
//! callers fan out over many instances.

use super::model::{Instance, Operation};
use super::operation::{OperationHandle, OperationWaiter};
use super::pager::{AggregatedPager, InstancePager};
use super::request::{
    AggregatedListInstancesRequest, DeleteInstanceRequest, InsertInstanceRequest,
    ListInstancesRequest,
};
use crate::error::{ComputeError, Result};
use crate::gcp::client::{ClientConfig, ComputeClient};
use crate::report;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Instance operations over an open client
pub struct Instances<'a> {
    client: &'a ComputeClient,
    cancel: Option<CancellationToken>,
}

impl<'a> Instances<'a> {
    pub fn new(client: &'a ComputeClient) -> Self {
        Self {
            client,
            cancel: None,
        }
    }

    /// Abort operation waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn waiter(&self) -> OperationWaiter<'a> {
        let waiter = OperationWaiter::new(self.client);
        match &self.cancel {
            Some(token) => waiter.with_cancellation(token.clone()),
            None => waiter,
        }
    }

    /// Insert an instance and wait for the insert to finish
    pub async fn create<W: Write>(&self, out: &mut W, request: &InsertInstanceRequest) -> Result<()> {
        request.validate()?;

        let url = self
            .client
            .compute_zonal_url(&request.project, &request.zone, "instances");
        tracing::info!(
            "Creating instance {} in {}/{} ({})",
            request.name,
            request.project,
            request.zone,
            request.machine_type
        );

        let body = request.body()?;
        let operation: Operation = self
            .client
            .post(&url, Some(&body), &request.query())
            .await?;
        let mut handle = OperationHandle::new(operation);

        self.waiter()
            .wait_and_report(out, &mut handle, &request.project)
            .await?;
        handle.ensure_success()?;

        report::instance_created(out, &request.name)?;
        Ok(())
    }

    /// Delete an instance and wait for the delete to finish
    pub async fn delete<W: Write>(&self, out: &mut W, request: &DeleteInstanceRequest) -> Result<()> {
        request.validate()?;

        let url = self.client.compute_zonal_url(
            &request.project,
            &request.zone,
            &format!("instances/{}", urlencoding::encode(&request.name)),
        );
        tracing::info!(
            "Deleting instance {} in {}/{}",
            request.name,
            request.project,
            request.zone
        );

        let operation: Operation = self.client.delete(&url).await?;
        let mut handle = OperationHandle::new(operation);

        self.waiter()
            .wait_and_report(out, &mut handle, &request.project)
            .await?;
        handle.ensure_success()?;

        report::instance_deleted(out, &request.name)?;
        Ok(())
    }

    /// Pager over the instances of one zone
    pub fn pager(&self, request: &ListInstancesRequest) -> InstancePager<'a> {
        let url = self
            .client
            .compute_zonal_url(&request.project, &request.zone, "instances");
        let mut query = self.page_size_query();
        if let Some(filter) = &request.filter {
            query.push(("filter", filter.clone()));
        }
        InstancePager::new(self.client, url, query)
    }

    /// Pager over `(zone key, instances)` groups of a project
    pub fn aggregated_pager(&self, request: &AggregatedListInstancesRequest) -> AggregatedPager<'a> {
        let url = self
            .client
            .compute_aggregated_url(&request.project, "instances");
        let mut query = self.page_size_query();
        if let Some(filter) = &request.filter {
            query.push(("filter", filter.clone()));
        }
        if request.return_partial_success {
            query.push(("returnPartialSuccess", "true".to_string()));
        }
        AggregatedPager::new(self.client, url, query)
    }

    fn page_size_query(&self) -> Vec<(&'static str, String)> {
        self.client
            .page_size
            .map(|n| vec![("maxResults", n.to_string())])
            .unwrap_or_default()
    }

    /// Print every instance of one zone; an empty zone prints only the header
    pub async fn list<W: Write>(&self, out: &mut W, request: &ListInstancesRequest) -> Result<Vec<Instance>> {
        request.validate()?;

        let mut pager = self.pager(request);
        let mut found = Vec::new();

        report::zone_header(out, &request.zone)?;
        while let Some(instance) = pager.next().await? {
            report::instance_line(out, &instance)?;
            found.push(instance);
        }

        tracing::debug!("Listed {} instances in {}", found.len(), request.zone);
        Ok(found)
    }

    /// Print instances of every zone, one group at a time, in the order the
    /// server returns them
    ///
    /// Groups are written as they arrive. A zone key that shows up again on a
    /// later page is written again; zones without instances are skipped.
    pub async fn list_all<W: Write>(
        &self,
        out: &mut W,
        request: &AggregatedListInstancesRequest,
    ) -> Result<usize> {
        request.validate()?;

        let mut pager = self.aggregated_pager(request);
        let mut count = 0;

        report::aggregated_header(out)?;
        while let Some((zone, scoped)) = pager.next().await? {
            if scoped.instances.is_empty() {
                continue;
            }
            report::zone_key(out, &zone)?;
            for instance in &scoped.instances {
                report::instance_line(out, instance)?;
            }
            count += scoped.instances.len();
        }

        tracing::debug!(
            "Listed {} instances across {} pages",
            count,
            pager.pages_fetched()
        );
        Ok(count)
    }
}

/// Create an instance; writes `Instance created` only once the insert
/// operation finished without error
pub async fn create_instance<W: Write>(
    out: &mut W,
    config: &ClientConfig,
    request: &InsertInstanceRequest,
) -> Result<()> {
    let client = ComputeClient::open(config).await?;
    let instances = Instances::new(&client);
    instances.create(out, request).await
}

/// Delete an instance; writes `Instance deleted` only once the delete
/// operation finished without error
pub async fn delete_instance<W: Write>(
    out: &mut W,
    config: &ClientConfig,
    request: &DeleteInstanceRequest,
) -> Result<()> {
    let client = ComputeClient::open(config).await?;
    let instances = Instances::new(&client);
    instances.delete(out, request).await
}

/// List the instances of one zone
pub async fn list_instances<W: Write>(
    out: &mut W,
    config: &ClientConfig,
    request: &ListInstancesRequest,
) -> Result<()> {
    let client = ComputeClient::open(config).await?;
    let instances = Instances::new(&client);
    instances.list(out, request).await?;
    Ok(())
}

/// List instances across all zones of a project
pub async fn list_all_instances<W: Write>(
    out: &mut W,
    config: &ClientConfig,
    request: &AggregatedListInstancesRequest,
) -> Result<()> {
    let client = ComputeClient::open(config).await?;
    let instances = Instances::new(&client);
    instances.list_all(out, request).await?;
    Ok(())
}

/// Fetch an operation by name and wait for it
///
/// Used to resume waiting on an operation started elsewhere (e.g. by an
/// earlier, interrupted invocation).
pub async fn wait_for_named_operation<W: Write>(
    out: &mut W,
    config: &ClientConfig,
    project: &str,
    zone: &str,
    operation: &str,
) -> Result<()> {
    if operation.trim().is_empty() {
        return Err(ComputeError::Config("operation name must not be empty".to_string()));
    }

    let client = ComputeClient::open(config).await?;
    let url = client.compute_zonal_url(
        project,
        zone,
        &format!("operations/{}", urlencoding::encode(operation)),
    );
    let operation: Operation = client.get(&url, &[]).await?;
    let mut handle = OperationHandle::new(operation);

    OperationWaiter::new(&client)
        .wait_and_report(out, &mut handle, project)
        .await?;
    handle.ensure_success()
}

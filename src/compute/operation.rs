//! Long-running operation waiter
//!
//! Mutating calls return an [`Operation`] that the server completes in the
//! background. [`OperationWaiter`] suspends the calling task until the
//! operation reaches DONE or ERROR, bounded by a deadline and optionally
//! cancelled through a [`CancellationToken`].

use super::model::{Operation, OperationScope, OperationStatus};
use crate::error::{ComputeError, Result};
use crate::gcp::client::ComputeClient;
use crate::report;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Handle to a server-side operation
///
/// Once a terminal status has been observed it is cached and the handle is
/// never polled again.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    operation: Operation,
    terminal: Option<OperationStatus>,
    polls: u32,
}

impl OperationHandle {
    pub fn new(operation: Operation) -> Self {
        let status = operation.status();
        Self {
            terminal: status.is_terminal().then_some(status),
            operation,
            polls: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.operation.name
    }

    /// Last observed status
    pub fn status(&self) -> OperationStatus {
        match &self.terminal {
            Some(status) => status.clone(),
            None => self.operation.status(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Number of wait calls sent for this handle
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Turn an ERROR terminal status into `ComputeError::Operation`
    pub fn ensure_success(&self) -> Result<()> {
        match self.status() {
            OperationStatus::Done => Ok(()),
            OperationStatus::Error(message) => Err(ComputeError::Operation {
                name: self.name().to_string(),
                message,
            }),
            other => Err(ComputeError::Operation {
                name: self.name().to_string(),
                message: format!("operation is not finished ({})", other),
            }),
        }
    }

    fn wait_url(&self, client: &ComputeClient, project: &str) -> String {
        let resource = format!("operations/{}/wait", urlencoding::encode(self.name()));
        match self.operation.scope() {
            OperationScope::Zone(zone) => client.compute_zonal_url(project, &zone, &resource),
            OperationScope::Region(region) => client.compute_regional_url(project, &region, &resource),
            OperationScope::Global => client.compute_global_url(project, &resource),
        }
    }
}

/// Waits for operations to reach a terminal status
pub struct OperationWaiter<'a> {
    client: &'a ComputeClient,
    poll_interval: Duration,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl<'a> OperationWaiter<'a> {
    /// Waiter using the client's configured poll interval and deadline
    pub fn new(client: &'a ComputeClient) -> Self {
        Self {
            client,
            poll_interval: client.poll_interval,
            timeout: client.operation_timeout,
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Wait until `handle` is DONE or ERROR and return that status
    pub async fn wait(&self, handle: &mut OperationHandle, project: &str) -> Result<OperationStatus> {
        if let Some(status) = &handle.terminal {
            return Ok(status.clone());
        }

        let cancel = self.cancel.clone().unwrap_or_default();
        let timeout = self.timeout;
        let name = handle.name().to_string();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Wait for operation {} cancelled", name);
                Err(ComputeError::Cancelled)
            }
            result = tokio::time::timeout(timeout, self.poll_until_terminal(handle, project)) => {
                match result {
                    Ok(status) => status,
                    Err(_) => Err(ComputeError::Timeout(timeout)),
                }
            }
        }
    }

    /// Like [`wait`](Self::wait), then writes `Operation finished`
    pub async fn wait_and_report<W: Write>(
        &self,
        out: &mut W,
        handle: &mut OperationHandle,
        project: &str,
    ) -> Result<OperationStatus> {
        let status = self.wait(handle, project).await?;
        report::operation_finished(out, handle.name(), &status)?;
        Ok(status)
    }

    async fn poll_until_terminal(
        &self,
        handle: &mut OperationHandle,
        project: &str,
    ) -> Result<OperationStatus> {
        loop {
            let url = handle.wait_url(self.client, project);
            let operation: Operation = self.client.post(&url, None, &[]).await?;
            handle.polls += 1;

            let status = operation.status();
            tracing::debug!(
                "Operation {} is {} (poll {}, progress {:?})",
                operation.name,
                status.as_str(),
                handle.polls,
                operation.progress
            );
            handle.operation = operation;

            if status.is_terminal() {
                if let Some(elapsed) = handle.operation.elapsed() {
                    tracing::info!(
                        "Operation {} finished as {} after {}ms",
                        handle.name(),
                        status.as_str(),
                        elapsed.num_milliseconds()
                    );
                }
                handle.terminal = Some(status.clone());
                return Ok(status);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Wait for `handle` and report `Operation finished` once it is terminal
///
/// An operation that ends in ERROR is still reported as finished; callers
/// check the returned status (or [`OperationHandle::ensure_success`]) before
/// reporting their own success.
pub async fn wait_for_operation<W: Write>(
    out: &mut W,
    client: &ComputeClient,
    handle: &mut OperationHandle,
    project: &str,
) -> Result<OperationStatus> {
    OperationWaiter::new(client)
        .wait_and_report(out, handle, project)
        .await
}

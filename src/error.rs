//! Error types
//!
//! Every public operation returns [`ComputeError`] instead of aborting, so the
//! caller (CLI or test) decides what to do with a failure.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while talking to the Compute Engine API
#[derive(Error, Debug)]
pub enum ComputeError {
    /// The client could not be opened (credentials, HTTP client build)
    #[error("failed to open Compute client: {0}")]
    Connection(String),

    /// The API rejected the request
    #[error("API request failed: {status} {reason}: {message}")]
    Request {
        status: u16,
        reason: String,
        message: String,
    },

    /// The server answered with something the client cannot make progress on
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// The long-running operation finished in an error state
    #[error("operation {name} failed: {message}")]
    Operation { name: String, message: String },

    /// Pagination failed mid-stream
    #[error("listing aborted mid-stream: {0}")]
    Iteration(#[source] Box<ComputeError>),

    /// The waiter deadline passed before the operation finished
    #[error("operation did not finish within {0:?}")]
    Timeout(Duration),

    /// The wait was cancelled by the caller
    #[error("wait for operation was cancelled")]
    Cancelled,

    /// The request could not be sent or the response body not read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected
    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing to the output sink failed
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, ComputeError>;

impl ComputeError {
    /// HTTP status of a rejected request, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Iteration(inner) => inner.status(),
            _ => None,
        }
    }

    /// Resource already exists (409 / alreadyExists)
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Request { status, reason, .. } => *status == 409 || reason == "alreadyExists",
            _ => false,
        }
    }

    /// Resource, zone, or project not found (404 / notFound)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Request { status, reason, .. } => *status == 404 || reason == "notFound",
            Self::Iteration(inner) => inner.is_not_found(),
            _ => false,
        }
    }

    /// Authentication or authorization failure (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

//! Error taxonomy and the optional error sink.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced through the engine's error callback.
///
/// Intake never returns these to the caller; the callback is the only
/// path out of the engine. Soft failures (blank context id, empty
/// extraction, queue overflow) are silent by contract and never
/// constructed here.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API answered with a non-2xx status.
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The request hit the client-side timeout.
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Any other transport-level failure.
    #[error("Network error")]
    Network(#[source] reqwest::Error),

    /// Initialization failed; the engine stays un-initialized.
    #[error("initialization failed: {0}")]
    Init(String),

    /// Unexpected failure around the worker loop; the loop continues.
    #[error("worker error: {0}")]
    Worker(String),
}

impl CatalogError {
    /// HTTP status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Callback receiving internally caught failures.
///
/// Invoked from the worker task and from intake paths, so it must be
/// thread-safe. Panics raised by the callback itself are swallowed.
pub type ErrorCallback = Arc<dyn Fn(&CatalogError) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct ErrorSink {
    callback: Option<ErrorCallback>,
}

impl ErrorSink {
    pub fn new(callback: Option<ErrorCallback>) -> Self {
        Self { callback }
    }

    /// Invokes the callback, swallowing anything it throws back.
    pub fn report(&self, err: &CatalogError) {
        if let Some(callback) = &self.callback {
            let _ = catch_unwind(AssertUnwindSafe(|| callback(err)));
        }
    }
}

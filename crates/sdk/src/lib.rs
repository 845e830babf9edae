//! Fire-and-forget SDK for submitting XML field observations to the
//! Ceremony Field Catalog API.
//!
//! Design principles:
//! - intake never fails and never blocks the caller
//! - processing happens on a single background worker task
//! - every internally caught failure is routed to an optional error
//!   callback instead of surfacing
//!
//! This makes the SDK safe to embed in systems where catalog submission
//! is non-critical telemetry: a full queue drops new submissions, a dead
//! endpoint costs one classified error per batch, and nothing ever
//! reaches the business flow.
//!
//! ## Usage
//!
//! Call [`initialize`] once at application startup, then
//! [`submit_observations_str`] (or the bytes/tree variants) for each XML
//! document. Both forward to a process-wide [`CatalogEngine`]; construct
//! one directly with [`CatalogEngine::start`] when an explicit handle is
//! preferable.
//!
//! ```no_run
//! use ceremony_catalog_sdk::{initialize, submit_observations_str, EngineConfig};
//!
//! # async fn example() {
//! initialize(EngineConfig::new("https://catalog.example.com"));
//!
//! let metadata = [("documenttype".to_string(), "PROFILE".to_string())]
//!     .into_iter()
//!     .collect();
//! submit_observations_str("<Root><Child>v</Child></Root>", "deposits", Some(metadata));
//! # }
//! ```

mod engine;
mod error;
mod extract;
mod observation;
mod transport;

pub use engine::{CatalogEngine, EngineConfig, XmlSource, DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY};
pub use error::{CatalogError, ErrorCallback};
pub use extract::Extractor;
pub use observation::{Metadata, Observation};

use std::sync::RwLock;
use std::time::Duration;

// Process-wide engine slot. The lock guards initialization and reset
// only; intake takes the shared side.
static ENGINE: RwLock<Option<CatalogEngine>> = RwLock::new(None);

/// Initializes the process-wide engine. Idempotent: the first call wins
/// and later calls are no-ops. Never panics; a failed start is routed to
/// the config's error callback and the engine stays un-initialized.
///
/// Must run inside a tokio runtime (the worker is spawned on it).
pub fn initialize(config: EngineConfig) {
    let sink_callback = config.on_error.clone();
    let Ok(mut slot) = ENGINE.write() else {
        return;
    };
    if slot.is_some() {
        return;
    }
    match CatalogEngine::start(config) {
        Ok(engine) => *slot = Some(engine),
        Err(err) => {
            if let Some(callback) = sink_callback {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(&err)));
            }
        }
    }
}

/// Whether the process-wide engine has been initialized.
pub fn is_initialized() -> bool {
    ENGINE.read().map(|g| g.is_some()).unwrap_or(false)
}

/// Submits XML observations from raw bytes. Fire-and-forget; a no-op
/// before [`initialize`] or after [`shutdown`].
pub fn submit_observations_bytes(xml: &[u8], context_id: &str, metadata: Option<Metadata>) {
    with_engine(|engine| engine.submit_bytes(xml, context_id, metadata));
}

/// Submits XML observations from a string. Fire-and-forget; a no-op
/// before [`initialize`] or after [`shutdown`].
pub fn submit_observations_str(xml: &str, context_id: &str, metadata: Option<Metadata>) {
    with_engine(|engine| engine.submit_str(xml, context_id, metadata));
}

/// Submits XML observations from an already-parsed document.
/// Fire-and-forget; a no-op before [`initialize`] or after [`shutdown`].
pub fn submit_observations_document(
    doc: &roxmltree::Document<'_>,
    context_id: &str,
    metadata: Option<Metadata>,
) {
    with_engine(|engine| engine.submit_document(doc, context_id, metadata));
}

/// Drains and stops the process-wide engine. Returns `true` immediately
/// when not initialized, otherwise `true` once the worker confirms the
/// queue is empty within `timeout`.
pub async fn shutdown(timeout: Duration) -> bool {
    let engine = ENGINE.read().ok().and_then(|g| g.clone());
    match engine {
        Some(engine) => engine.shutdown(timeout).await,
        None => true,
    }
}

/// Submissions dropped by the process-wide engine because the queue was
/// full. Zero when not initialized.
pub fn dropped_submissions() -> u64 {
    ENGINE
        .read()
        .ok()
        .and_then(|g| g.as_ref().map(|e| e.dropped_submissions()))
        .unwrap_or(0)
}

/// Discards the process-wide engine unconditionally. Testing only: the
/// queue is not drained gracefully, though the worker will still post
/// what it already holds before noticing the channel closed.
pub fn reset() {
    if let Ok(mut slot) = ENGINE.write() {
        *slot = None;
    }
}

fn with_engine(f: impl FnOnce(&CatalogEngine)) {
    if let Ok(guard) = ENGINE.read() {
        if let Some(engine) = guard.as_ref() {
            f(engine);
        }
    }
}

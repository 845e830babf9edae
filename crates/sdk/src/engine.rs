//! Engine lifecycle: bounded queue, background worker, graceful drain.

use crate::error::{CatalogError, ErrorCallback, ErrorSink};
use crate::extract::Extractor;
use crate::observation::{Metadata, Observation};
use crate::transport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::debug;

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine construction parameters.
///
/// `batch_size` of zero falls back to [`DEFAULT_BATCH_SIZE`]; a missing
/// `http` client is built with a 30-second request timeout. The base URL
/// loses any trailing slash.
pub struct EngineConfig {
    pub base_url: String,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub on_error: Option<ErrorCallback>,
    /// Long-lived shared HTTP client; per-request timeouts live here.
    pub http: Option<reqwest::Client>,
}

impl EngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            on_error: None,
            http: None,
        }
    }
}

/// One XML input, by shape. Extraction itself is shared; the shapes only
/// differ in how the tree is obtained.
pub enum XmlSource<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
    Tree(&'a roxmltree::Document<'a>),
}

/// A unit of work owned by the queue, then by the worker until all of its
/// batches have been attempted.
pub(crate) struct WorkItem {
    pub context_id: String,
    pub observations: Vec<Observation>,
}

struct EngineInner {
    tx: mpsc::Sender<WorkItem>,
    shut_down: AtomicBool,
    shutdown_signal: Arc<Notify>,
    drained: Mutex<Option<oneshot::Receiver<()>>>,
    dropped: AtomicU64,
    sink: ErrorSink,
    extractor: Extractor,
}

/// Handle to a running observation engine.
///
/// Cheap to clone; all clones share the queue and the worker. Most
/// applications use the process-wide instance through the module-level
/// functions in the crate root instead of holding a handle directly.
#[derive(Clone)]
pub struct CatalogEngine {
    inner: Arc<EngineInner>,
}

impl CatalogEngine {
    /// Starts an engine: builds the HTTP client, creates the bounded
    /// queue, and spawns the background worker on the ambient tokio
    /// runtime. Fails with `CatalogError::Init` when no runtime is
    /// running or the HTTP client cannot be built.
    pub fn start(config: EngineConfig) -> Result<Self, CatalogError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| CatalogError::Init(format!("no tokio runtime available: {e}")))?;

        let http = match config.http {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(DEFAULT_REQUEST_TIMEOUT)
                .build()
                .map_err(|e| CatalogError::Init(format!("failed to build HTTP client: {e}")))?,
        };

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let batch_size = if config.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            config.batch_size
        };
        let capacity = config.queue_capacity.max(1);
        let sink = ErrorSink::new(config.on_error);

        let (tx, rx) = mpsc::channel(capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let shutdown_signal = Arc::new(Notify::new());

        handle.spawn(run_worker(
            rx,
            http,
            base_url,
            batch_size,
            sink.clone(),
            shutdown_signal.clone(),
            done_tx,
        ));

        Ok(Self {
            inner: Arc::new(EngineInner {
                tx,
                shut_down: AtomicBool::new(false),
                shutdown_signal,
                drained: Mutex::new(Some(done_rx)),
                dropped: AtomicU64::new(0),
                sink,
                extractor: Extractor::default(),
            }),
        })
    }

    /// Submits XML field observations. Fire-and-forget: returns
    /// immediately, never blocks, never fails. Extraction runs on the
    /// calling thread so the engine never retains the raw buffer.
    pub fn submit(&self, source: XmlSource<'_>, context_id: &str, metadata: Option<Metadata>) {
        if self.inner.shut_down.load(Ordering::Acquire) {
            return;
        }
        let context_id = context_id.trim();
        if context_id.is_empty() {
            return;
        }

        let metadata = metadata.unwrap_or_default();
        let extractor = &self.inner.extractor;
        let observations = match source {
            XmlSource::Bytes(xml) => extractor.from_bytes(xml, &metadata),
            XmlSource::Text(xml) => extractor.from_str(xml, &metadata),
            XmlSource::Tree(doc) => extractor.from_document(doc, &metadata),
        };
        if observations.is_empty() {
            return;
        }

        let item = WorkItem {
            context_id: context_id.to_string(),
            observations,
        };
        // Queue full: drop the new item rather than block the caller.
        if self.inner.tx.try_send(item).is_err() {
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn submit_bytes(&self, xml: &[u8], context_id: &str, metadata: Option<Metadata>) {
        self.submit(XmlSource::Bytes(xml), context_id, metadata);
    }

    pub fn submit_str(&self, xml: &str, context_id: &str, metadata: Option<Metadata>) {
        self.submit(XmlSource::Text(xml), context_id, metadata);
    }

    pub fn submit_document(
        &self,
        doc: &roxmltree::Document<'_>,
        context_id: &str,
        metadata: Option<Metadata>,
    ) {
        self.submit(XmlSource::Tree(doc), context_id, metadata);
    }

    /// Submissions dropped because the queue was full.
    pub fn dropped_submissions(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Signals the worker to exit once everything already queued has been
    /// posted and waits up to `timeout` for confirmation. Returns `true`
    /// on a clean drain (and on repeated calls after one). Intake after
    /// shutdown silently returns.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.inner.shut_down.store(true, Ordering::Release);
        self.inner.shutdown_signal.notify_one();

        let done_rx = self.inner.drained.lock().ok().and_then(|mut g| g.take());
        let Some(done_rx) = done_rx else {
            return true;
        };

        match tokio::time::timeout(timeout, done_rx).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                // Worker went away without confirming.
                self.inner
                    .sink
                    .report(&CatalogError::Worker("worker exited unexpectedly".to_string()));
                false
            }
            Err(_) => false,
        }
    }
}

/// The single background consumer. Takes one work item at a time, slices
/// it into contiguous batches, posts them in order, and routes every
/// failure to the sink without abandoning the remaining batches or the
/// loop.
async fn run_worker(
    mut rx: mpsc::Receiver<WorkItem>,
    http: reqwest::Client,
    base_url: String,
    batch_size: usize,
    sink: ErrorSink,
    shutdown_signal: Arc<Notify>,
    done: oneshot::Sender<()>,
) {
    debug!("observation worker started");
    loop {
        let item = tokio::select! {
            item = rx.recv() => match item {
                Some(item) => item,
                None => break,
            },
            _ = shutdown_signal.notified() => break,
        };
        process_work_item(&http, &base_url, batch_size, &sink, item).await;
    }

    // Drain whatever made it into the queue before the signal.
    while let Ok(item) = rx.try_recv() {
        process_work_item(&http, &base_url, batch_size, &sink, item).await;
    }

    debug!("observation worker drained");
    let _ = done.send(());
}

async fn process_work_item(
    http: &reqwest::Client,
    base_url: &str,
    batch_size: usize,
    sink: &ErrorSink,
    item: WorkItem,
) {
    let url = transport::observations_url(base_url, &item.context_id);
    for batch in item.observations.chunks(batch_size) {
        if let Err(err) = transport::send_batch(http, &url, batch).await {
            sink.report(&err);
        }
    }
}

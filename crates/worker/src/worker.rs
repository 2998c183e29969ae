use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::message::{ImportReply, ImportRequest, ImportResponse, RequestId};
use intake_sheet::{ingest, ExtractOptions, ImportSource, IngestError};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, info, warn};

struct Job {
    request: ImportRequest,
    reply: oneshot::Sender<ImportReply>,
}

/// Handle to a background import worker
///
/// Requests queue on a bounded channel. Each one runs the ingestion pipeline
/// in its own blocking task so decoding never stalls the async runtime, and
/// each gets exactly one [`ImportReply`]. Dropping every handle closes the
/// queue; queued requests are still answered.
#[derive(Debug, Clone)]
pub struct ImportWorker {
    tx: mpsc::Sender<Job>,
}

impl ImportWorker {
    /// Start the worker on the current tokio runtime
    pub fn spawn(config: &WorkerConfig, options: ExtractOptions) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

        tokio::spawn(dispatch(rx, permits, options));
        debug!(
            queue_depth = config.queue_depth,
            max_concurrent = config.max_concurrent,
            "import worker started"
        );

        ImportWorker { tx }
    }

    /// Import one file and wait for its reply
    pub async fn submit(&self, source: ImportSource) -> Result<ImportReply> {
        self.submit_request(ImportRequest::new(source)).await
    }

    /// Import with a caller-chosen request id
    pub async fn submit_request(&self, request: ImportRequest) -> Result<ImportReply> {
        let id = request.id;
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(Job {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| WorkerError::Closed)?;

        reply_rx.await.map_err(|_| WorkerError::NoReply(id))
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<Job>,
    permits: Arc<Semaphore>,
    options: ExtractOptions,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        tokio::spawn(async move {
            let _permit = permit;
            let Job { request, reply } = job;
            let id = request.id;

            let response = run_isolated(id, request.source, options).await;
            if reply.send(ImportReply { id, response }).is_err() {
                debug!(request_id = %id, "caller went away before the reply");
            }
        });
    }

    debug!("import queue closed");
}

/// Run one pipeline on the blocking pool and fold every outcome into a response
async fn run_isolated(id: RequestId, source: ImportSource, options: ExtractOptions) -> ImportResponse {
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || ingest(source, &options)).await;

    let response = match outcome {
        Ok(result) => ImportResponse::from(result),
        Err(join_error) => {
            ImportResponse::failure(&IngestError::Parse(format!("extraction aborted: {join_error}")))
        }
    };

    match &response {
        ImportResponse::Success(extraction) => info!(
            request_id = %id,
            sheets = extraction.sheets.len(),
            rows = extraction.row_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "import finished"
        ),
        ImportResponse::Failure { error } => warn!(
            request_id = %id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            %error,
            "import failed"
        ),
    }

    response
}

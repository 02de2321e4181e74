//! The stats worker: a dedicated thread owning the store handle
//!
//! The worker is shared-nothing: the read-only connection lives on the
//! worker thread for its whole life, and the only way in or out is a pair
//! of mpsc channels carrying [`StatsRequest`] and [`StatsResponse`]
//! messages. Requests are processed strictly in arrival order and each one
//! produces exactly one response, so the supervisor correlates responses
//! to requests positionally.

use std::path::PathBuf;
use std::thread;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::data::{Database, DatabaseError, StatsStore};

use super::messages::{StatsRequest, StatsResponse};

/// Outstanding requests/responses the channels buffer before `send` applies
/// backpressure.
const CHANNEL_CAPACITY: usize = 32;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("failed to spawn stats worker thread: {0}")]
    Spawn(std::io::Error),
    #[error("stats worker is no longer running")]
    Disconnected,
}

/// Spawns the stats worker
pub struct StatsWorker;

impl StatsWorker {
    /// Open the store at `path` and start the worker thread.
    ///
    /// The store is opened before the thread starts: if the file is missing
    /// or unreadable this returns the error and no worker exists, so no
    /// request can ever be accepted against a broken store.
    pub fn spawn(path: impl Into<PathBuf>) -> Result<StatsWorkerHandle, WorkerError> {
        let path = path.into();
        let db = Database::open_read_only(path.clone())?;
        let store = StatsStore::new(db);

        let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);

        thread::Builder::new()
            .name("replay-stats".into())
            .spawn(move || worker_loop(store, request_rx, response_tx))
            .map_err(WorkerError::Spawn)?;

        info!(path = %path.display(), "stats worker started");
        Ok(StatsWorkerHandle {
            requests: request_tx,
            responses: response_rx,
        })
    }
}

/// Supervisor-side handle to a running stats worker.
///
/// Requests may be pipelined: any number of [`send`](Self::send) calls may
/// be in flight before the first [`recv`](Self::recv); responses arrive in
/// request order. Dropping the handle closes the request channel and the
/// worker thread exits after finishing the request it is on; a response in
/// flight at that point is lost, which callers must treat as unknown
/// outcome rather than silently retrying.
pub struct StatsWorkerHandle {
    requests: mpsc::Sender<StatsRequest>,
    responses: mpsc::Receiver<StatsResponse>,
}

impl StatsWorkerHandle {
    /// Queue a request without waiting for its response
    pub async fn send(&self, request: StatsRequest) -> Result<(), WorkerError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Await the next response, in request order. Returns `None` once the
    /// worker has exited and all buffered responses are drained.
    pub async fn recv(&mut self) -> Option<StatsResponse> {
        self.responses.recv().await
    }

    /// Send one request and await its response.
    ///
    /// Only valid when no other request is outstanding on this handle;
    /// with pipelined requests, use `send`/`recv` and count.
    pub async fn request(&mut self, request: StatsRequest) -> Result<StatsResponse, WorkerError> {
        self.send(request).await?;
        self.recv().await.ok_or(WorkerError::Disconnected)
    }
}

fn worker_loop(
    store: StatsStore,
    mut requests: mpsc::Receiver<StatsRequest>,
    responses: mpsc::Sender<StatsResponse>,
) {
    while let Some(request) = requests.blocking_recv() {
        let response = execute(&store, request);
        debug!(response = response.kind(), "request served");
        if responses.blocking_send(response).is_err() {
            // Supervisor dropped the handle mid-request.
            break;
        }
    }
    debug!("stats worker shutting down");
}

/// Run one query. Failures become an `Error` response at this boundary;
/// the worker stays alive for subsequent requests.
fn execute(store: &StatsStore, request: StatsRequest) -> StatsResponse {
    let result = match request {
        StatsRequest::GetNames => store.get_names().map(|data| StatsResponse::Names { data }),
        StatsRequest::GetConnectCodes => store
            .get_connect_codes()
            .map(|data| StatsResponse::ConnectCodes { data }),
    };

    result.unwrap_or_else(|e| {
        warn!(request = ?request, error = %e, "stats query failed");
        StatsResponse::Error {
            error: e.to_string(),
        }
    })
}

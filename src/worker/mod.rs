//! Aggregation worker and its message protocol

mod messages;
mod stats_worker;

pub use messages::{StatsRequest, StatsResponse};
pub use stats_worker::{StatsWorker, StatsWorkerHandle, WorkerError};

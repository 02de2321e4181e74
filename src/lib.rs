pub mod bridge;
pub mod data;
pub mod util;
pub mod worker;

pub use bridge::{IpcBridge, Subscription};
pub use data::{Database, DatabaseError, NameTally, Player, PlayerField, StatsStore};
pub use worker::{StatsRequest, StatsResponse, StatsWorker, StatsWorkerHandle, WorkerError};

//! Store access layer for replaydeck
//!
//! Read-only SQLite access to the replay archive plus the tally aggregation
//! both worker operations are built on.

mod database;
mod models;
mod stats;

pub use database::{Database, DatabaseError, BUSY_TIMEOUT_MS};
pub use models::{NameTally, Player};
pub use stats::{PlayerField, StatsStore};

//! Request/response vocabulary for the stats worker
//!
//! Closed tagged unions; the wire shape is `{"type": ...}` with camelCase
//! tags. Adding an operation means adding a variant here and handling it
//! exhaustively in the worker loop.

use serde::{Deserialize, Serialize};

use crate::data::NameTally;

/// A query the supervisor can ask of the stats worker. No payload beyond
/// the tag; both operations are parameterless and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StatsRequest {
    GetNames,
    GetConnectCodes,
}

/// The worker's answer. Exactly one response is emitted per request, in
/// request order; failures travel as the `Error` variant rather than
/// tearing the worker down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StatsResponse {
    Names { data: Vec<NameTally> },
    ConnectCodes { data: Vec<NameTally> },
    Error { error: String },
}

impl StatsResponse {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            StatsResponse::Names { .. } => "names",
            StatsResponse::ConnectCodes { .. } => "connectCodes",
            StatsResponse::Error { .. } => "error",
        }
    }
}

//! Data types shared between the store layer and the worker protocol

use serde::{Deserialize, Serialize};

/// One aggregated tally row: a name (or connect code) and how many times it
/// appeared across all replays. Produced fresh per query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTally {
    pub name: String,
    pub total: i64,
}

/// One element of a replay's `players` list, as stored in the
/// semi-structured `players` column.
///
/// Both fields are optional in the wild: older replays predate connect
/// codes, and unnamed players show up with an empty or missing display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_code: Option<String>,
}

impl Player {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            connect_code: None,
        }
    }

    pub fn with_connect_code(mut self, code: impl Into<String>) -> Self {
        self.connect_code = Some(code.into());
        self
    }
}

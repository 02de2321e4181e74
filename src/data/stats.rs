//! Tally aggregation over the replay store
//!
//! Both worker operations are the same query shape: unnest each replay's
//! `players` JSON array, pull one string field out of every element, drop
//! empty/absent values, and count occurrences per distinct value. The field
//! being extracted is the only thing that varies, so it is a parameter here
//! rather than two copies of the query.

use rusqlite::Result as SqliteResult;
use tracing::debug;

use super::database::{Database, DatabaseError};
use super::models::NameTally;

/// Which player field a tally groups on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    DisplayName,
    ConnectCode,
}

impl PlayerField {
    /// JSON path of the field inside a `players` element
    fn json_path(self) -> &'static str {
        match self {
            PlayerField::DisplayName => "$.displayName",
            PlayerField::ConnectCode => "$.connectCode",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerField::DisplayName => "displayName",
            PlayerField::ConnectCode => "connectCode",
        }
    }
}

/// Aggregation queries against a replay store.
///
/// Owns the read-only [`Database`] handle; nothing else touches the
/// connection. Every query re-scans the store, so results always reflect
/// whatever the ingestion writer has committed so far.
#[derive(Debug)]
pub struct StatsStore {
    db: Database,
}

impl StatsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Tally display names across all replays, most frequent first
    pub fn get_names(&self) -> Result<Vec<NameTally>, DatabaseError> {
        self.tally(PlayerField::DisplayName)
    }

    /// Tally connect codes across all replays, most frequent first
    pub fn get_connect_codes(&self) -> Result<Vec<NameTally>, DatabaseError> {
        self.tally(PlayerField::ConnectCode)
    }

    fn tally(&self, field: PlayerField) -> Result<Vec<NameTally>, DatabaseError> {
        // json_each unnests the one-to-many players list per replay row.
        // The path comes from a closed enum, never from caller input.
        let sql = format!(
            "SELECT json_extract(p.value, '{path}') AS name, COUNT(*) AS total
             FROM replays AS r, json_each(r.players) AS p
             WHERE json_extract(p.value, '{path}') IS NOT NULL
               AND json_extract(p.value, '{path}') <> ''
             GROUP BY name
             ORDER BY total DESC, name ASC",
            path = field.json_path()
        );

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NameTally {
                    name: row.get(0)?,
                    total: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(field = field.as_str(), groups = rows.len(), "tally complete");
        Ok(rows)
    }
}

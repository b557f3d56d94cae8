//! Snapshot materialization: the deduplicated latest-value set and the
//! append-only replay stream.

use crate::{Command, CommandRunner, StoreError};
use chrono::Utc;
use std::sync::Arc;
use types::Snapshot;

/// Default key namespace for materialized snapshots.
pub const DEFAULT_PREFIX: &str = "ticks";

/// Writes consumed snapshots into the store.
///
/// Two writes per snapshot:
/// - `<prefix>:<code>` — a scored set holding the serialized snapshot with
///   score = event-timestamp millis, inserted only-if-absent so redelivery
///   of the same (code, timestamp) never duplicates an entry;
/// - `<prefix>_stream:<code>` — an always-appended replay stream that is
///   allowed to contain duplicates; it exists for audit and replay, not for
///   point lookups.
#[derive(Clone)]
pub struct SnapshotStore {
    runner: Arc<dyn CommandRunner>,
    prefix: String,
}

impl SnapshotStore {
    pub fn new(runner: Arc<dyn CommandRunner>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            runner,
            prefix: if prefix.is_empty() {
                DEFAULT_PREFIX.to_string()
            } else {
                prefix
            },
        }
    }

    /// Key of the latest-value set for an instrument.
    pub fn set_key(&self, code: &str) -> String {
        format!("{}:{}", self.prefix, code)
    }

    /// Key of the replay stream for an instrument.
    pub fn stream_key(&self, code: &str) -> String {
        format!("{}_stream:{}", self.prefix, code)
    }

    /// Materialize one snapshot: dedup-set insert, then stream append.
    pub async fn record(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let payload = serde_json::to_string(snapshot)?;
        let timestamp_ms = if snapshot.timestamp_ms != 0 {
            snapshot.timestamp_ms
        } else {
            Utc::now().timestamp_millis()
        };

        let zadd = Command::new("ZADD")
            .arg(self.set_key(&snapshot.code))
            .arg("NX")
            .arg_int(timestamp_ms)
            .arg(&payload);
        self.runner.run(zadd).await?;

        let xadd = Command::new("XADD")
            .arg(self.stream_key(&snapshot.code))
            .arg("*")
            .arg("code")
            .arg(&snapshot.code)
            .arg("board")
            .arg(&snapshot.board)
            .arg("timestamp")
            .arg_int(timestamp_ms)
            .arg("payload")
            .arg(&payload);
        self.runner.run(xadd).await?;

        Ok(())
    }
}

//! # Tickline Store - Time-Series Engine Client
//!
//! A narrow, idempotent wrapper over a remote key/range-query time-series
//! engine, shared by two unrelated producers:
//!
//! - the materialize service, which writes snapshot history (a deduplicated
//!   latest-value set plus an append-only replay stream), and
//! - telemetry producers, which record scalar metrics on their own keys.
//!
//! The wire protocol is RESP: commands are arrays of bulk strings, replies
//! are decoded into [`Reply`]. Everything above the [`CommandRunner`] seam is
//! pure command construction and reply interpretation, so it is unit-testable
//! without a live engine; [`StoreClient`] supplies the real TCP transport.
//!
//! The client holds no per-call state beyond its underlying connection and is
//! safe for concurrent use by independent callers operating on disjoint keys.

mod client;
mod error;
mod keys;
mod resp;
mod snapshots;
mod telemetry;
mod timeseries;

pub use client::{StoreClient, StoreConfig};
pub use error::StoreError;
pub use keys::{sanitize_id, series_key};
pub use resp::{read_reply, Command, Reply};
pub use snapshots::SnapshotStore;
pub use telemetry::Telemetry;
pub use timeseries::{RangeOptions, Sample, SeriesOptions, TimeSeries};

use async_trait::async_trait;

/// Executes one wire command against the time-series engine.
///
/// Implementations must map engine error replies to
/// [`StoreError::Command`] so callers can inspect the engine's message (the
/// idempotent-create path depends on recognizing "key already exists").
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: Command) -> Result<Reply, StoreError>;
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records issued commands and plays back scripted replies.
    pub struct RecordingRunner {
        pub commands: Mutex<Vec<Command>>,
        replies: Mutex<VecDeque<Result<Reply, StoreError>>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                replies: Mutex::new(VecDeque::new()),
            }
        }

        pub fn push_reply(&self, reply: Result<Reply, StoreError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        pub fn command_lines(&self) -> Vec<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.to_line())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: Command) -> Result<Reply, StoreError> {
            self.commands.lock().unwrap().push(command);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Reply::Simple("OK".to_string())))
        }
    }
}

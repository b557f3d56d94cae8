//! Environment-driven configuration for the ingest binary.

use serde::{Deserialize, Serialize};

/// Runtime settings, each overridable through an `INGEST_*` variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Feed file to stream, one pipe-delimited ladder line per row.
    pub data_file: String,
    /// Destination topic for encoded snapshots.
    pub topic: String,
    /// Partition count used when provisioning the topic.
    pub partitions: u32,
    /// Replication factor used when provisioning the topic.
    pub replication: u32,
    /// Hours east of UTC the feed's timestamps are expressed in.
    pub feed_utc_offset_hours: i32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_file: "data.txt".to_string(),
            topic: "ticks".to_string(),
            partitions: 1,
            replication: 1,
            feed_utc_offset_hours: 7,
        }
    }
}

impl IngestConfig {
    /// Defaults overridden by whatever `INGEST_*` variables are set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_file: env_string("INGEST_DATA_FILE", defaults.data_file),
            topic: env_string("INGEST_TOPIC", defaults.topic),
            partitions: env_parsed("INGEST_TOPIC_PARTITIONS", defaults.partitions),
            replication: env_parsed("INGEST_TOPIC_REPLICATION", defaults.replication),
            feed_utc_offset_hours: env_parsed(
                "INGEST_FEED_UTC_OFFSET_HOURS",
                defaults.feed_utc_offset_hours,
            ),
        }
    }
}

pub(crate) fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}

pub(crate) fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

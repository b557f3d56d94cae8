//! # Tickline Feedlog - Ordered Partitioned Append Log
//!
//! The boundary between the ingestion pipeline and its message log. The log
//! is an ordered, partitioned, at-least-once delivery primitive: records
//! appended with the same partition key are read back in the order written,
//! and a reader that crashes between handling a record and committing its
//! offset will see that record again.
//!
//! ## Contract
//!
//! - **Provisioning** is idempotent at the call site: [`LogError::TopicExists`]
//!   is a distinct variant so callers can treat "already there" as success.
//! - **Ordering** holds within a partition only. Publishers that need
//!   per-instrument ordering must use the instrument code as the record key.
//! - **Delivery** is at-least-once. Offsets advance only on explicit
//!   [`TopicReader::commit`]; redelivery of uncommitted records after a
//!   reader restart is expected and must be tolerated downstream.
//!
//! [`MemoryLog`] realizes this contract in-process for tests and single-node
//! runs; production deployments swap in a broker-backed implementation behind
//! the same traits.

mod error;
mod memory;

pub use error::LogError;
pub use memory::{MemoryLog, MemoryReader, MemoryWriter};

use async_trait::async_trait;

/// A record appended to (or fetched from) a topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Partition key. All records sharing a key land on one partition and
    /// are therefore totally ordered relative to each other.
    pub key: Vec<u8>,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// Event-time of the record in epoch milliseconds. Zero means "unset";
    /// the log stamps unset records with wall-clock time on append.
    pub timestamp_ms: i64,
}

/// A fetched record together with its position in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub record: Record,
}

/// Minimal configuration needed to ensure a topic exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicConfig {
    pub name: String,
    pub partitions: u32,
    pub replication: u32,
}

impl TopicConfig {
    /// Build a config, clamping partition and replication counts to at
    /// least one.
    pub fn new(name: impl Into<String>, partitions: u32, replication: u32) -> Self {
        Self {
            name: name.into(),
            partitions: partitions.max(1),
            replication: replication.max(1),
        }
    }
}

/// Administrative operations on the log.
#[async_trait]
pub trait LogAdmin: Send + Sync {
    /// Create the topic. Returns [`LogError::TopicExists`] when the topic is
    /// already present so callers can decide whether that is acceptable.
    async fn create_topic(&self, config: &TopicConfig) -> Result<(), LogError>;
}

/// Appends records to a single topic.
#[async_trait]
pub trait TopicWriter: Send + Sync {
    async fn append(&self, record: Record) -> Result<(), LogError>;

    /// Release writer resources. Appending after close fails.
    async fn close(&self) -> Result<(), LogError>;
}

/// Reads records from a single topic in commit order.
#[async_trait]
pub trait TopicReader: Send + Sync {
    /// Fetch the next unread record, waiting when the log is drained. The
    /// future is cancel-safe: dropping it before completion consumes nothing.
    async fn fetch(&mut self) -> Result<Delivery, LogError>;

    /// Commit the reader's offset past the given delivery. Records at or
    /// before a committed offset are never redelivered to this group.
    async fn commit(&mut self, delivery: &Delivery) -> Result<(), LogError>;
}

/// Stable FNV-1a hash used to map record keys onto partitions. The log's
/// partition assignment must not change across process restarts, so this
/// deliberately avoids the randomly-seeded std hasher.
pub fn partition_for_key(key: &[u8], partitions: u32) -> u32 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in key {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % u64::from(partitions.max(1))) as u32
}

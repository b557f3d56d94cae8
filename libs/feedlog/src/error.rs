//! Error types for the feed log boundary.

use thiserror::Error;

/// Errors surfaced by log implementations.
#[derive(Debug, Error)]
pub enum LogError {
    /// The topic name was empty where one is required.
    #[error("topic name is required")]
    TopicRequired,

    /// Topic creation found the topic already present. Provisioning callers
    /// treat this as success.
    #[error("topic {topic} already exists")]
    TopicExists {
        /// The topic that was already present.
        topic: String,
    },

    /// The topic has not been provisioned on this log.
    #[error("unknown topic {topic}")]
    UnknownTopic {
        /// The topic that was requested.
        topic: String,
    },

    /// Append attempted through a writer that was already closed.
    #[error("writer for topic {topic} is closed")]
    WriterClosed {
        /// The topic whose writer was closed.
        topic: String,
    },

    /// A commit referenced a partition the topic does not have.
    #[error("topic {topic} has no partition {partition}")]
    UnknownPartition {
        /// The topic being committed to.
        topic: String,
        /// The out-of-range partition index.
        partition: u32,
    },
}

impl LogError {
    /// Whether this error means "the topic is already there", which
    /// idempotent provisioning treats as success.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, LogError::TopicExists { .. })
    }
}

//! Error types for the ingest service.

use codec::CodecError;
use feedlog::LogError;
use thiserror::Error;

/// Structural parse failures. The offending line is skipped; ingestion
/// continues.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// Ladder line had no board/data section after the leading timestamp.
    #[error("malformed line: missing board/data section")]
    MissingBoardSection,

    /// Ladder line had no field section after the board.
    #[error("malformed line: missing symbol section")]
    MissingSymbolSection,

    /// Index line did not have exactly the expected field count.
    #[error("malformed index line: {count} fields, expected {expected}")]
    UnexpectedFieldCount {
        /// Fields found on the line.
        count: usize,
        /// Fields the index contract requires.
        expected: usize,
    },
}

/// Validation failures lifting a parsed record into a snapshot. The record
/// is dropped and never published.
#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    /// The record has no instrument code after prefix stripping.
    #[error("record is missing required field `code`")]
    MissingCode,

    /// The record has no event timestamp, or its millisecond value is zero.
    #[error("record is missing required field `timestamp`")]
    MissingTimestamp,
}

/// Failures on the publish path.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Neither the call nor the publisher configuration named a topic.
    /// Raised before any writer or network interaction.
    #[error("topic is required")]
    TopicRequired,

    /// The snapshot failed required-field validation. Per-line; skip and
    /// continue.
    #[error("snapshot for {code:?} is not publishable")]
    InvalidSnapshot {
        /// Code of the rejected snapshot (possibly empty).
        code: String,
    },

    /// Snapshot could not be encoded. Per-line; skip and continue.
    #[error(transparent)]
    Encode(#[from] CodecError),

    /// The topic could not be provisioned. Fatal at startup.
    #[error("provision topic {topic}: {source}")]
    Provisioning {
        topic: String,
        #[source]
        source: LogError,
    },

    /// A writer could not be created for the topic.
    #[error("create writer for topic {topic}: {source}")]
    Writer {
        topic: String,
        #[source]
        source: LogError,
    },

    /// The log rejected an append. Fatal to the run: continuing would risk
    /// silently broken per-instrument ordering.
    #[error("append to topic {topic}: {source}")]
    Append {
        topic: String,
        #[source]
        source: LogError,
    },

    /// A writer failed to close during shutdown.
    #[error("close writer for topic {topic}: {source}")]
    Close {
        topic: String,
        #[source]
        source: LogError,
    },
}

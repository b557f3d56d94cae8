//! Error types for the materialize service.
//!
//! Every variant here is fatal to the consume loop: past the fetch, skipping
//! a message would either lose data or commit the offset beyond an
//! unmaterialized record.

use codec::CodecError;
use feedlog::LogError;
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The log could not deliver the next record.
    #[error("fetch from log: {0}")]
    Fetch(#[source] LogError),

    /// A fetched payload could not be decoded into a snapshot.
    #[error(transparent)]
    Decode(#[from] CodecError),

    /// One of the two store writes failed.
    #[error(transparent)]
    StoreWrite(#[from] StoreError),

    /// The offset commit failed after a successful store write.
    #[error("commit offset: {0}")]
    Commit(#[source] LogError),
}

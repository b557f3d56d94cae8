//! # Tickline Materialize - Log-to-Store Consumer Service
//!
//! Drains the feed log in commit order and materializes each snapshot into
//! the time-series store: a dedup-set insert plus a replay-stream append,
//! then an offset commit.
//!
//! ## Delivery
//!
//! Offsets are committed only after both store writes succeed, so delivery
//! into the store is at-least-once. A crash between write and commit replays
//! the message; the dedup set absorbs the replay, the replay stream keeps it
//! by design.

pub mod config;
pub mod consumer;
pub mod error;

pub use config::MaterializeConfig;
pub use consumer::Consumer;
pub use error::ConsumeError;

//! # Tickline Ingest - Feed-to-Log Publisher Service
//!
//! Transforms raw pipe-delimited feed lines into validated [`types::Snapshot`]
//! records and appends them to the feed log keyed by instrument code.
//!
//! ## Pipeline
//!
//! ```text
//! raw line ── LineParser ──▶ ParsedRecord ── map_snapshot ──▶ Snapshot
//!                                                               │
//!                                              Publisher (bincode, key = code)
//!                                                               ▼
//!                                                          feed log topic
//! ```
//!
//! ## Failure policy
//!
//! Per-line problems (malformed structure, missing required fields, encode
//! failures) are logged and skipped; the source stream keeps flowing. A
//! failed append is fatal: skipping there would silently break per-instrument
//! ordering, so the run stops instead.

pub mod config;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod publisher;
pub mod schema;

pub use config::IngestConfig;
pub use error::{MapError, ParseError, PublishError};
pub use mapper::map_snapshot;
pub use parser::{IndexParser, LadderParser};
pub use publisher::{ensure_topic, Publisher, WriterFactory};
pub use schema::{ColumnDef, ColumnKind, ColumnSchema, INDEX_FIELD_COUNT};

//! # Tickline Types - Canonical Feed Data Model
//!
//! Shared type system for the tickline ingestion pipeline. Everything that
//! crosses a crate boundary lives here:
//!
//! - [`FieldValue`] — closed sum type over the value kinds a feed column can
//!   produce (text, integer, float, timestamp). Parsers never hand out
//!   dynamically-typed values; mappers match exhaustively over this enum.
//! - [`ParsedRecord`] — the transient name → value map produced per feed line.
//! - [`Snapshot`] — the validated, immutable per-instrument tick with its
//!   ten-level bid/ask ladders and trade aggregates.
//!
//! This crate is deliberately free of I/O and async dependencies so the data
//! model can be used from parsers, codecs, and stores alike.

mod snapshot;
mod value;

pub use snapshot::{PriceLevel, Snapshot, LADDER_DEPTH};
pub use value::{FieldValue, ParsedRecord};

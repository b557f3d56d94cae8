//! Loosely-typed field values exchanged between the column parser and the
//! snapshot mapper.

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

/// A single parsed column value.
///
/// The set of variants is closed on purpose: every column kind a schema can
/// declare maps to exactly one of these, and accessors on [`ParsedRecord`]
/// match exhaustively so a schema change cannot introduce silent type
/// confusion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// An event instant carried in the feed's exchange-local offset.
    Timestamp(DateTime<FixedOffset>),
}

/// Transient mapping from field name to typed value, produced per feed line.
///
/// Keys come from the column schema and are static by construction. Inserts
/// are last-write-wins; schemas are built so no name is double-mapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecord {
    fields: HashMap<&'static str, FieldValue>,
}

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text accessor; absent or non-text fields read as the empty string.
    pub fn text(&self, name: &str) -> &str {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => s.as_str(),
            Some(FieldValue::Integer(_))
            | Some(FieldValue::Float(_))
            | Some(FieldValue::Timestamp(_))
            | None => "",
        }
    }

    /// Integer accessor; floats are truncated, everything else reads as zero.
    pub fn integer(&self, name: &str) -> i64 {
        match self.fields.get(name) {
            Some(FieldValue::Integer(v)) => *v,
            Some(FieldValue::Float(v)) => *v as i64,
            Some(FieldValue::Text(_)) | Some(FieldValue::Timestamp(_)) | None => 0,
        }
    }

    /// Float accessor; integers are widened, everything else reads as zero.
    pub fn float(&self, name: &str) -> f64 {
        match self.fields.get(name) {
            Some(FieldValue::Float(v)) => *v,
            Some(FieldValue::Integer(v)) => *v as f64,
            Some(FieldValue::Text(_)) | Some(FieldValue::Timestamp(_)) | None => 0.0,
        }
    }

    /// Timestamp accessor; absent or non-timestamp fields read as `None`.
    pub fn timestamp(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        match self.fields.get(name) {
            Some(FieldValue::Timestamp(ts)) => Some(*ts),
            Some(FieldValue::Text(_))
            | Some(FieldValue::Integer(_))
            | Some(FieldValue::Float(_))
            | None => None,
        }
    }
}

//! Line parsers for the two pipe-delimited feed variants.
//!
//! Parsing is deliberately two-tiered: structural problems (missing
//! sections, wrong field count) fail the line, while individual bad field
//! values degrade to zero or "no value". The feed mixes clean and dirty
//! rows and a single garbled number must not drop an otherwise usable tick.

use crate::error::ParseError;
use crate::schema::{
    strip_venue_prefix, ColumnKind, ColumnSchema, INDEX_COLUMNS, INDEX_FIELD_COUNT, LADDER_COLUMNS,
};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::Arc;
use types::{FieldValue, ParsedRecord};

/// Exchange-local offset the feed's epoch-millisecond timestamps are
/// interpreted in (UTC+7).
pub fn feed_offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).expect("UTC+7 is a valid fixed offset")
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

fn wall_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Parses ladder lines: `<epoch_millis>|<board>|<symbol>|<fields…>`.
///
/// The leading timestamp and board are positional sections, not schema
/// columns; everything after the board is matched against the ladder
/// column schema.
#[derive(Clone)]
pub struct LadderParser {
    offset: FixedOffset,
    clock: Clock,
}

impl LadderParser {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            clock: wall_clock(),
        }
    }

    /// Same parser with a fixed clock, for deterministic tests.
    pub fn with_clock(offset: FixedOffset, clock: Clock) -> Self {
        Self { offset, clock }
    }

    /// Parse one line. `Ok(None)` means the line was blank and should be
    /// skipped without comment.
    pub fn parse(&self, line: &str) -> Result<Option<ParsedRecord>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let mut sections = line.split('|');
        let timestamp_token = sections.next().unwrap_or_default();
        let board = sections.next().ok_or(ParseError::MissingBoardSection)?;
        let fields: Vec<&str> = sections.collect();
        if fields.is_empty() {
            return Err(ParseError::MissingSymbolSection);
        }

        let mut record = ParsedRecord::new();
        record.insert("board", FieldValue::Text(board.to_string()));
        if let Some(at) = parse_millis(timestamp_token, &self.offset) {
            record.insert("timestamp", FieldValue::Timestamp(at));
        }

        // Column 0 is the prefixed symbol; its pre-image is kept verbatim.
        record.insert("raw_symbol", FieldValue::Text(fields[0].to_string()));

        apply_schema(&mut record, &LADDER_COLUMNS, &fields, &self.offset, &self.clock);

        // The feed appends a server-side receipt time near the end of the
        // row. Best effort: absent, zero or garbled values are ignored.
        if fields.len() >= 2 {
            let candidate = fields[fields.len() - 2];
            if let Some(at) = parse_millis(candidate, &self.offset) {
                if at.timestamp_millis() != 0 {
                    record.insert("server_timestamp", FieldValue::Timestamp(at));
                }
            }
        }

        Ok(Some(record))
    }
}

/// Parses index summary lines: exactly [`INDEX_FIELD_COUNT`] pipe-delimited
/// fields, no board or raw-symbol handling.
#[derive(Clone)]
pub struct IndexParser {
    offset: FixedOffset,
    clock: Clock,
}

impl IndexParser {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            clock: wall_clock(),
        }
    }

    pub fn with_clock(offset: FixedOffset, clock: Clock) -> Self {
        Self { offset, clock }
    }

    pub fn parse(&self, line: &str) -> Result<Option<ParsedRecord>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != INDEX_FIELD_COUNT {
            return Err(ParseError::UnexpectedFieldCount {
                count: fields.len(),
                expected: INDEX_FIELD_COUNT,
            });
        }

        let mut record = ParsedRecord::new();
        apply_schema(&mut record, &INDEX_COLUMNS, &fields, &self.offset, &self.clock);
        Ok(Some(record))
    }
}

fn apply_schema(
    record: &mut ParsedRecord,
    schema: &ColumnSchema,
    fields: &[&str],
    offset: &FixedOffset,
    clock: &Clock,
) {
    for (index, def) in schema.iter() {
        // Trailing optional columns may be missing on shorter rows.
        let Some(raw) = fields.get(*index) else {
            continue;
        };
        if let Some(value) = convert(def.kind, raw, offset, clock) {
            record.insert(def.name, value);
        }
    }
}

/// Total conversion of one raw field. Bad numerics become zero, bad
/// timestamps become "no value"; only [`ColumnKind::Timestamp`] can yield
/// `None`.
fn convert(
    kind: ColumnKind,
    raw: &str,
    offset: &FixedOffset,
    clock: &Clock,
) -> Option<FieldValue> {
    let raw = raw.trim();
    match kind {
        ColumnKind::Text => Some(FieldValue::Text(raw.to_string())),
        ColumnKind::Integer => Some(FieldValue::Integer(raw.parse().unwrap_or(0))),
        ColumnKind::Float => Some(FieldValue::Float(raw.parse().unwrap_or(0.0))),
        ColumnKind::Timestamp => parse_millis(raw, offset).map(FieldValue::Timestamp),
        ColumnKind::Symbol => Some(FieldValue::Text(strip_venue_prefix(raw).to_string())),
        ColumnKind::Received => Some(FieldValue::Timestamp(clock().with_timezone(offset))),
    }
}

fn parse_millis(raw: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let millis: i64 = raw.trim().parse().ok()?;
    offset.timestamp_millis_opt(millis).single()
}

//! Positional column schemas for the two feed line variants.
//!
//! A schema is an ordered association list from column index to definition.
//! Indices are sparse on purpose: the feed carries columns this pipeline does
//! not consume, and trailing optional columns may be missing entirely on
//! older rows. Both situations are tolerated by lookup, not by error.

use once_cell::sync::Lazy;

/// Value kind a column parses into, with one total conversion rule per kind
/// (see `parser::convert`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Raw text, kept as-is.
    Text,
    /// Integer; empty or unparsable input reads as zero.
    Integer,
    /// Float; empty or unparsable input reads as zero.
    Float,
    /// Epoch-millisecond timestamp at the feed offset; empty or unparsable
    /// input reads as "no value".
    Timestamp,
    /// Instrument token: the 2-character venue prefix (e.g. `S#`) is
    /// stripped, idempotently, to produce the bare code.
    Symbol,
    /// Synthetic received-at timestamp drawn from the parser clock, for
    /// schemas whose rows carry no time of their own.
    Received,
}

/// One column: target field name plus value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered (by column index) mapping from position to column definition.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<(usize, ColumnDef)>,
}

impl ColumnSchema {
    /// Build a schema. Indices need not be contiguous. Duplicate indices or
    /// duplicate field names are construction bugs.
    pub fn new(mut columns: Vec<(usize, ColumnDef)>) -> Self {
        columns.sort_by_key(|(index, _)| *index);
        debug_assert!(
            columns.windows(2).all(|w| w[0].0 != w[1].0),
            "duplicate column index"
        );
        debug_assert!(
            {
                let mut names: Vec<_> = columns.iter().map(|(_, def)| def.name).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate column name"
        );
        Self { columns }
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDef> {
        self.columns
            .binary_search_by_key(&index, |(i, _)| *i)
            .ok()
            .map(|pos| &self.columns[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, ColumnDef)> {
        self.columns.iter()
    }
}

/// Field names of the ten bid levels, `(price, volume)` per level,
/// best-to-worst. Shared with the snapshot mapper.
pub const BID_LEVELS: [(&str, &str); 10] = [
    ("bid1", "bid1_volume"),
    ("bid2", "bid2_volume"),
    ("bid3", "bid3_volume"),
    ("bid4", "bid4_volume"),
    ("bid5", "bid5_volume"),
    ("bid6", "bid6_volume"),
    ("bid7", "bid7_volume"),
    ("bid8", "bid8_volume"),
    ("bid9", "bid9_volume"),
    ("bid10", "bid10_volume"),
];

/// Field names of the ten ask levels, `(price, volume)` per level.
pub const ASK_LEVELS: [(&str, &str); 10] = [
    ("ask1", "ask1_volume"),
    ("ask2", "ask2_volume"),
    ("ask3", "ask3_volume"),
    ("ask4", "ask4_volume"),
    ("ask5", "ask5_volume"),
    ("ask6", "ask6_volume"),
    ("ask7", "ask7_volume"),
    ("ask8", "ask8_volume"),
    ("ask9", "ask9_volume"),
    ("ask10", "ask10_volume"),
];

/// Exact field count of an index summary line.
pub const INDEX_FIELD_COUNT: usize = 26;

/// Schema of equity/derivative ladder lines: symbol, ten bid and ten ask
/// levels, then trade aggregates at fixed sparse offsets. Unlisted offsets
/// are ignored.
pub static LADDER_COLUMNS: Lazy<ColumnSchema> = Lazy::new(|| {
    let mut columns = vec![(0, ColumnDef::new("code", ColumnKind::Symbol))];

    for (level, (price, volume)) in BID_LEVELS.iter().enumerate() {
        columns.push((1 + level * 2, ColumnDef::new(price, ColumnKind::Float)));
        columns.push((2 + level * 2, ColumnDef::new(volume, ColumnKind::Integer)));
    }
    for (level, (price, volume)) in ASK_LEVELS.iter().enumerate() {
        columns.push((21 + level * 2, ColumnDef::new(price, ColumnKind::Float)));
        columns.push((22 + level * 2, ColumnDef::new(volume, ColumnKind::Integer)));
    }

    columns.extend([
        (41, ColumnDef::new("last_price", ColumnKind::Float)),
        (43, ColumnDef::new("highest_price", ColumnKind::Float)),
        (44, ColumnDef::new("instrument_type", ColumnKind::Text)),
        (45, ColumnDef::new("lowest_price", ColumnKind::Float)),
        (47, ColumnDef::new("foreign_buy_volume", ColumnKind::Integer)),
        (48, ColumnDef::new("foreign_buy_value", ColumnKind::Integer)),
        (49, ColumnDef::new("foreign_sell_volume", ColumnKind::Integer)),
        (50, ColumnDef::new("foreign_sell_value", ColumnKind::Integer)),
        (51, ColumnDef::new("change", ColumnKind::Float)),
        (53, ColumnDef::new("total_match_volume", ColumnKind::Integer)),
        (54, ColumnDef::new("total_match_value", ColumnKind::Integer)),
        (55, ColumnDef::new("total_bid_volume", ColumnKind::Integer)),
        (56, ColumnDef::new("total_ask_volume", ColumnKind::Integer)),
        (57, ColumnDef::new("open_interest", ColumnKind::Integer)),
        (58, ColumnDef::new("ceiling_price", ColumnKind::Float)),
        (59, ColumnDef::new("floor_price", ColumnKind::Float)),
        (60, ColumnDef::new("reference_price", ColumnKind::Float)),
        (61, ColumnDef::new("expire_date", ColumnKind::Text)),
        (62, ColumnDef::new("session", ColumnKind::Text)),
        (64, ColumnDef::new("foreign_room", ColumnKind::Text)),
        (69, ColumnDef::new("group", ColumnKind::Text)),
        (71, ColumnDef::new("floating_shares", ColumnKind::Integer)),
    ]);

    ColumnSchema::new(columns)
});

/// Schema of index summary lines: exactly [`INDEX_FIELD_COUNT`] fields.
pub static INDEX_COLUMNS: Lazy<ColumnSchema> = Lazy::new(|| {
    ColumnSchema::new(vec![
        (0, ColumnDef::new("timestamp", ColumnKind::Timestamp)),
        (1, ColumnDef::new("index_id", ColumnKind::Symbol)),
        (2, ColumnDef::new("last", ColumnKind::Float)),
        (3, ColumnDef::new("volume_ex_negotiated", ColumnKind::Integer)),
        (4, ColumnDef::new("value_ex_negotiated", ColumnKind::Integer)),
        (5, ColumnDef::new("advancers", ColumnKind::Integer)),
        (6, ColumnDef::new("decliners", ColumnKind::Integer)),
        (7, ColumnDef::new("unchanged", ColumnKind::Integer)),
        (10, ColumnDef::new("negotiated_volume", ColumnKind::Integer)),
        (11, ColumnDef::new("negotiated_value", ColumnKind::Integer)),
        (12, ColumnDef::new("matched_timestamp", ColumnKind::Integer)),
        (13, ColumnDef::new("matched_volume", ColumnKind::Integer)),
        (14, ColumnDef::new("server_time", ColumnKind::Timestamp)),
        (15, ColumnDef::new("previous_volume", ColumnKind::Integer)),
        (16, ColumnDef::new("open", ColumnKind::Float)),
        (17, ColumnDef::new("high", ColumnKind::Float)),
        (18, ColumnDef::new("low", ColumnKind::Float)),
        (19, ColumnDef::new("change", ColumnKind::Float)),
        (20, ColumnDef::new("percent_change", ColumnKind::Float)),
        (25, ColumnDef::new("projected_settlement", ColumnKind::Float)),
    ])
});

/// Strip the 2-character venue prefix (a letter plus `#`, e.g. `S#` or `I#`)
/// from an instrument token. Idempotent: a token without the prefix comes
/// back unchanged, so `strip(strip(x)) == strip(x)`.
pub fn strip_venue_prefix(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() > 2 && bytes[1] == b'#' {
        &token[2..]
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_schema_is_sparse_and_ordered() {
        assert!(LADDER_COLUMNS.get(0).is_some());
        assert_eq!(LADDER_COLUMNS.get(41).unwrap().name, "last_price");
        // 42 is an unlisted feed column.
        assert!(LADDER_COLUMNS.get(42).is_none());
        assert_eq!(LADDER_COLUMNS.get(71).unwrap().name, "floating_shares");

        let mut prev = None;
        for (index, _) in LADDER_COLUMNS.iter() {
            assert!(prev.map_or(true, |p| p < *index));
            prev = Some(*index);
        }
    }

    #[test]
    fn index_schema_strips_prefix_on_id() {
        let def = INDEX_COLUMNS.get(1).unwrap();
        assert_eq!(def.name, "index_id");
        assert_eq!(def.kind, ColumnKind::Symbol);
    }

    #[test]
    fn strip_removes_only_the_venue_prefix() {
        assert_eq!(strip_venue_prefix("S#41I1F8000"), "41I1F8000");
        assert_eq!(strip_venue_prefix("I#VNFINLEAD"), "VNFINLEAD");
        assert_eq!(strip_venue_prefix("VN30F1M"), "VN30F1M");
        // Too short to carry both a prefix and a code.
        assert_eq!(strip_venue_prefix("S#"), "S#");
        assert_eq!(strip_venue_prefix(""), "");
    }

    #[test]
    fn strip_is_idempotent() {
        for token in ["S#41I1F8000", "I#VNFINLEAD", "VN30F1M", "S#", "x"] {
            let once = strip_venue_prefix(token);
            assert_eq!(strip_venue_prefix(once), once);
        }
    }
}

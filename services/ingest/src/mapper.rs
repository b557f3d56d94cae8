//! Lifts a [`ParsedRecord`] into a validated [`Snapshot`].

use crate::error::MapError;
use crate::schema::{ASK_LEVELS, BID_LEVELS};
use types::{ParsedRecord, PriceLevel, Snapshot, LADDER_DEPTH};

/// Validate and map a parsed record into a snapshot.
///
/// Pure and all-or-nothing: a record without a non-empty `code` or a
/// non-zero-millisecond `timestamp` is rejected and nothing is emitted.
/// Every other field defaults to zero or empty when absent.
pub fn map_snapshot(record: &ParsedRecord) -> Result<Snapshot, MapError> {
    let code = record.text("code");
    if code.is_empty() {
        return Err(MapError::MissingCode);
    }
    let timestamp_ms = record
        .timestamp("timestamp")
        .map(|at| at.timestamp_millis())
        .filter(|millis| *millis != 0)
        .ok_or(MapError::MissingTimestamp)?;

    let mut bids = [PriceLevel::default(); LADDER_DEPTH];
    let mut asks = [PriceLevel::default(); LADDER_DEPTH];
    for level in 0..LADDER_DEPTH {
        let (bid_price, bid_volume) = BID_LEVELS[level];
        let (ask_price, ask_volume) = ASK_LEVELS[level];
        bids[level] = PriceLevel::new(record.float(bid_price), record.integer(bid_volume));
        asks[level] = PriceLevel::new(record.float(ask_price), record.integer(ask_volume));
    }

    Ok(Snapshot {
        code: code.to_string(),
        board: record.text("board").to_string(),
        raw_symbol: record.text("raw_symbol").to_string(),
        timestamp_ms,
        server_timestamp_ms: record
            .timestamp("server_timestamp")
            .map(|at| at.timestamp_millis()),
        bids,
        asks,
        last_price: record.float("last_price"),
        highest_price: record.float("highest_price"),
        lowest_price: record.float("lowest_price"),
        change: record.float("change"),
        total_match_volume: record.integer("total_match_volume"),
        total_match_value: record.integer("total_match_value"),
        total_bid_volume: record.integer("total_bid_volume"),
        total_ask_volume: record.integer("total_ask_volume"),
        open_interest: record.integer("open_interest"),
        ceiling_price: record.float("ceiling_price"),
        floor_price: record.float("floor_price"),
        reference_price: record.float("reference_price"),
        foreign_buy_volume: record.integer("foreign_buy_volume"),
        foreign_buy_value: record.integer("foreign_buy_value"),
        foreign_sell_volume: record.integer("foreign_sell_volume"),
        foreign_sell_value: record.integer("foreign_sell_value"),
        foreign_room: record.text("foreign_room").to_string(),
        floating_shares: record.integer("floating_shares"),
        instrument_type: record.text("instrument_type").to_string(),
        session: record.text("session").to_string(),
        expire_date: record.text("expire_date").to_string(),
        group: record.text("group").to_string(),
    })
}

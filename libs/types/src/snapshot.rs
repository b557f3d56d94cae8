//! The canonical, validated per-instrument tick.

use serde::{Deserialize, Serialize};

/// Number of bid/ask ladder levels carried by the feed.
pub const LADDER_DEPTH: usize = 10;

/// One ladder level: price and resting volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub volume: i64,
}

impl PriceLevel {
    pub fn new(price: f64, volume: i64) -> Self {
        Self { price, volume }
    }
}

/// A fully validated, point-in-time market data record for one instrument.
///
/// Immutable once constructed. A snapshot with an empty `code` or a zero
/// `timestamp_ms` is invalid and must never be published; the snapshot mapper
/// enforces this before anything reaches the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    // Identity
    pub code: String,
    pub board: String,
    pub raw_symbol: String,

    // Time (epoch milliseconds)
    pub timestamp_ms: i64,
    pub server_timestamp_ms: Option<i64>,

    // Ladders, best-to-worst by level index
    pub bids: [PriceLevel; LADDER_DEPTH],
    pub asks: [PriceLevel; LADDER_DEPTH],

    // Trade aggregates
    pub last_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub change: f64,
    pub total_match_volume: i64,
    pub total_match_value: i64,
    pub total_bid_volume: i64,
    pub total_ask_volume: i64,
    pub open_interest: i64,
    pub ceiling_price: f64,
    pub floor_price: f64,
    pub reference_price: f64,
    pub foreign_buy_volume: i64,
    pub foreign_buy_value: i64,
    pub foreign_sell_volume: i64,
    pub foreign_sell_value: i64,
    pub foreign_room: String,
    pub floating_shares: i64,
    pub instrument_type: String,
    pub session: String,
    pub expire_date: String,
    pub group: String,
}

impl Snapshot {
    /// Whether the required identity and time fields are populated.
    pub fn is_valid(&self) -> bool {
        !self.code.is_empty() && self.timestamp_ms != 0
    }

    /// The first-write-wins dedup key: instrument code plus event time
    /// truncated to millisecond precision.
    pub fn dedup_key(&self) -> (&str, i64) {
        (&self.code, self.timestamp_ms)
    }
}

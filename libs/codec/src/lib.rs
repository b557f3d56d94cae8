//! # Tickline Codec - Snapshot Wire Format
//!
//! Compact binary encoding for [`Snapshot`] messages on the feed log. The
//! payload format is bincode over the serde representation of the snapshot:
//! fixed-width little-endian numerics, length-prefixed strings, no field
//! names on the wire.
//!
//! Encoding failures are per-record conditions: the publisher logs and skips
//! the offending line. Decoding failures on the consume path are fatal, the
//! consumer must not commit past a message it could not materialize.

use thiserror::Error;
use types::Snapshot;

/// Errors produced while encoding or decoding snapshot payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Snapshot could not be serialized to its wire form.
    #[error("encode snapshot {code}: {source}")]
    Encode {
        /// Instrument code of the snapshot that failed to encode.
        code: String,
        #[source]
        source: bincode::Error,
    },

    /// Payload bytes could not be decoded into a snapshot.
    #[error("decode snapshot payload ({len} bytes): {source}")]
    Decode {
        /// Length of the undecodable payload.
        len: usize,
        #[source]
        source: bincode::Error,
    },
}

/// Serialize a snapshot to its compact binary wire form.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(snapshot).map_err(|source| CodecError::Encode {
        code: snapshot.code.clone(),
        source,
    })
}

/// Deserialize a snapshot from the bytes produced by [`encode_snapshot`].
pub fn decode_snapshot(payload: &[u8]) -> Result<Snapshot, CodecError> {
    bincode::deserialize(payload).map_err(|source| CodecError::Decode {
        len: payload.len(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::PriceLevel;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot {
            code: "41I1F8000".to_string(),
            board: "MAIN".to_string(),
            raw_symbol: "S#41I1F8000".to_string(),
            timestamp_ms: 1_754_535_567_282,
            server_timestamp_ms: Some(1_754_547_232_540),
            last_price: 1718.0,
            highest_price: 1732.2,
            lowest_price: 1710.0,
            change: -1.5,
            total_match_volume: 172_480,
            total_match_value: 29_665_063_450_000,
            open_interest: 56_214,
            ceiling_price: 1839.8,
            floor_price: 1599.2,
            reference_price: 1719.5,
            instrument_type: "vnf".to_string(),
            session: "N".to_string(),
            expire_date: "21/08/2025".to_string(),
            group: "VN30".to_string(),
            ..Snapshot::default()
        };
        snapshot.bids[0] = PriceLevel::new(1717.9, 1);
        snapshot.asks[0] = PriceLevel::new(1718.1, 2);
        snapshot
    }

    #[test]
    fn round_trip_reproduces_snapshot() {
        let snapshot = sample_snapshot();
        let payload = encode_snapshot(&snapshot).unwrap();
        let decoded = decode_snapshot(&payload).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn decode_rejects_garbage() {
        // A truncated payload must surface as a decode error, not a panic.
        let payload = encode_snapshot(&sample_snapshot()).unwrap();
        let err = decode_snapshot(&payload[..payload.len() / 2]).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn empty_payload_is_a_decode_error() {
        assert!(matches!(
            decode_snapshot(&[]),
            Err(CodecError::Decode { len: 0, .. })
        ));
    }
}

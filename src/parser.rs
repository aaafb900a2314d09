//! Market data message types
//!
//! Wire structs carried inside each frame of a stream file, plus the
//! timestamped message the collator merges.

use serde::{Deserialize, Serialize};

use crate::collate::Timestamped;
use crate::config::MdCategory;

/// Price level (price, size pair) as sent by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub size: f64,
}

impl Level {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// A single exchange trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub size: f64,
    /// Exchange timestamp (microseconds)
    pub exchange_time_us: i64,
    /// Aggressor was the buyer
    pub buy: bool,
}

/// Incremental depth diff. A level with size zero removes that price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthUpdate {
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    /// Exchange timestamp (microseconds)
    pub exchange_time_us: i64,
}

/// Frame payload of a trade stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleTradeMessage {
    /// Local receive time (microseconds)
    pub local_time_us: i64,
    pub message: Trade,
}

/// Frame payload of a depth stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMessage {
    /// Local receive time (microseconds)
    pub local_time_us: i64,
    pub message: DepthUpdate,
}

/// Decoded payload of one frame
#[derive(Debug, Clone, PartialEq)]
pub enum MdPayload {
    Trade(Trade),
    Depth(DepthUpdate),
}

impl MdPayload {
    pub fn category(&self) -> MdCategory {
        match self {
            MdPayload::Trade(_) => MdCategory::Trade,
            MdPayload::Depth(_) => MdCategory::Depth,
        }
    }
}

/// A decoded message tagged with the key of the stream it came from
#[derive(Debug, Clone, PartialEq)]
pub struct MdMessage<K> {
    pub local_timestamp_ns: u64,
    pub update: MdPayload,
    pub key: K,
}

impl<K> Timestamped for MdMessage<K> {
    fn local_timestamp_ns(&self) -> u64 {
        self.local_timestamp_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_message_msgpack() {
        let msg = DepthMessage {
            local_time_us: 1_700_000_000_000_000,
            message: DepthUpdate {
                bids: vec![Level::new(50000.0, 1.5), Level::new(49999.0, 2.0)],
                asks: vec![Level::new(50001.0, 1.0)],
                exchange_time_us: 1_699_999_999_999_000,
            },
        };

        let bytes = rmp_serde::to_vec_named(&msg).unwrap();
        let decoded: DepthMessage = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded.message.bids.len(), 2);
        assert_eq!(decoded.message.asks[0].price, 50001.0);
    }

    #[test]
    fn test_payload_category() {
        let trade = MdPayload::Trade(Trade {
            price: 1.0,
            size: 2.0,
            exchange_time_us: 0,
            buy: true,
        });
        assert_eq!(trade.category(), MdCategory::Trade);
        assert_eq!(
            MdPayload::Depth(DepthUpdate::default()).category(),
            MdCategory::Depth
        );
    }
}

//! Order book module
//!
//! Rebuilds per-symbol books from depth diffs, recording what changed.

mod builder;
mod manager;
mod metrics;
mod updater;

pub use builder::{
    BookBuilder, BookSide, FnLevelHandler, LevelDecision, LevelHandler, LevelSize, PriceKey,
};
pub use manager::BookManager;
pub use metrics::BookMetrics;
pub use updater::{BookUpdater, PlainBook};

use serde::{Deserialize, Serialize};

use crate::parser::Level;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// A single level in the order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

impl PriceLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

impl From<Level> for PriceLevel {
    fn from(level: Level) -> Self {
        Self {
            price: level.price,
            size: level.size,
        }
    }
}

/// Before/after record for one touched price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedLevel {
    pub price: f64,
    pub previous_size: f64,
    pub current_size: f64,
}

/// Per-side diff records of the last applied update, in update order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatedLevels {
    pub bids: Vec<AnnotatedLevel>,
    pub asks: Vec<AnnotatedLevel>,
}

impl UpdatedLevels {
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Vec<AnnotatedLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Best bid and offer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbo {
    pub bid: PriceLevel,
    pub ask: PriceLevel,
}

impl Bbo {
    pub fn mid(&self) -> f64 {
        (self.bid.price + self.ask.price) * 0.5
    }

    /// Mid weighted towards the side with less resting size
    pub fn wmid(&self) -> f64 {
        let total = self.bid.size + self.ask.size;
        if total <= 0.0 {
            return self.mid();
        }
        (self.bid.price * self.ask.size + self.ask.price * self.bid.size) / total
    }

    pub fn spread(&self) -> f64 {
        self.ask.price - self.bid.price
    }

    pub fn is_crossed(&self) -> bool {
        self.bid.price >= self.ask.price
    }
}

/// Top-of-book snapshot for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookState {
    pub symbol: String,
    pub timestamp_ns: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub metrics: BookMetrics,
}

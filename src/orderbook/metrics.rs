//! Order book metrics calculation

use serde::{Deserialize, Serialize};

use super::PlainBook;

/// Levels summed for the plain imbalance
const IMBALANCE_LEVELS: usize = 5;
/// Levels and per-level decay for the weighted imbalance
const WEIGHTED_LEVELS: usize = 10;
const WEIGHTED_DECAY: f64 = 0.9;

/// Computed metrics for an order book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookMetrics {
    /// Mid price (average of best bid and ask)
    pub mid_price: Option<f64>,

    /// Spread in basis points
    pub spread_bps: Option<f64>,

    /// Simple imbalance: (bid_vol - ask_vol) / (bid_vol + ask_vol)
    pub imbalance: Option<f64>,

    /// Weighted imbalance (exponential decay with distance from the top)
    pub weighted_imbalance: Option<f64>,

    /// Total bid depth (volume)
    pub bid_depth: f64,

    /// Total ask depth (volume)
    pub ask_depth: f64,

    /// Number of bid levels
    pub bid_levels: usize,

    /// Number of ask levels
    pub ask_levels: usize,
}

impl BookMetrics {
    pub fn from_book(book: &PlainBook) -> Self {
        let bbo = book.compute_bbo();
        let mid_price = bbo.map(|b| b.mid());
        let spread_bps = bbo
            .filter(|b| b.mid() > 0.0)
            .map(|b| b.spread() / b.mid() * 10_000.0);

        Self {
            mid_price,
            spread_bps,
            imbalance: imbalance(book, IMBALANCE_LEVELS),
            weighted_imbalance: weighted_imbalance(book, WEIGHTED_LEVELS, WEIGHTED_DECAY),
            bid_depth: book.bid_levels().map(|(_, size)| size).sum(),
            ask_depth: book.ask_levels().map(|(_, size)| size).sum(),
            bid_levels: book.bids().len(),
            ask_levels: book.asks().len(),
        }
    }

    /// Check if the order book is healthy (has valid data)
    pub fn is_healthy(&self) -> bool {
        self.mid_price.is_some()
            && self.spread_bps.map_or(false, |s| s >= 0.0)
            && self.bid_levels > 0
            && self.ask_levels > 0
    }

    /// Get volume ratio (bid_depth / ask_depth)
    pub fn volume_ratio(&self) -> Option<f64> {
        if self.ask_depth > 0.0 {
            Some(self.bid_depth / self.ask_depth)
        } else {
            None
        }
    }
}

/// Order book imbalance over the top `levels` levels
pub fn imbalance(book: &PlainBook, levels: usize) -> Option<f64> {
    let bid_volume: f64 = book.bid_levels().take(levels).map(|(_, q)| q).sum();
    let ask_volume: f64 = book.ask_levels().take(levels).map(|(_, q)| q).sum();

    let total = bid_volume + ask_volume;
    if total > 0.0 {
        Some((bid_volume - ask_volume) / total)
    } else {
        None
    }
}

/// Imbalance with level `i` weighted by `decay^i`
pub fn weighted_imbalance(book: &PlainBook, levels: usize, decay: f64) -> Option<f64> {
    book.compute_bbo()?;

    let weigh = |(i, (_, q)): (usize, (f64, &f64))| q * decay.powi(i as i32);
    let bid_weighted: f64 = book.bid_levels().take(levels).enumerate().map(weigh).sum();
    let ask_weighted: f64 = book.ask_levels().take(levels).enumerate().map(weigh).sum();

    let total = bid_weighted + ask_weighted;
    if total > 0.0 {
        Some((bid_weighted - ask_weighted) / total)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::BookUpdater;
    use crate::parser::Level;

    fn create_test_book() -> BookUpdater {
        let mut book = BookUpdater::new();
        book.apply_depth_diff(
            &[Level::new(50000.0, 1.0), Level::new(49999.0, 2.0)],
            &[Level::new(50001.0, 1.5), Level::new(50002.0, 2.5)],
        );
        book
    }

    #[test]
    fn test_mid_price() {
        let metrics = create_test_book().metrics();
        assert_eq!(metrics.mid_price, Some(50000.5));
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_imbalance() {
        let book = create_test_book();
        // Bids: 1.0 + 2.0 = 3.0, Asks: 1.5 + 2.5 = 4.0
        let value = imbalance(book.book(), 10).unwrap();
        assert!((value - (-1.0 / 7.0)).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_imbalance_needs_both_sides() {
        let mut book = BookUpdater::new();
        book.apply_depth_diff(&[Level::new(1.0, 1.0)], &[]);
        assert!(weighted_imbalance(book.book(), 10, 0.9).is_none());
        assert_eq!(imbalance(book.book(), 10), Some(1.0));
    }

    #[test]
    fn test_depth_totals() {
        let metrics = create_test_book().metrics();
        assert_eq!(metrics.bid_depth, 3.0);
        assert_eq!(metrics.ask_depth, 4.0);
        assert_eq!(metrics.volume_ratio(), Some(0.75));
        assert_eq!(metrics.bid_levels, 2);
    }
}

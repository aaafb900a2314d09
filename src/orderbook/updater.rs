//! Plain size book driven by depth diffs
//!
//! Every touched price is recorded as an [`AnnotatedLevel`]; a level whose
//! new size is zero is removed (or never created).

use tracing::{debug, warn};

use super::builder::{BookBuilder, LevelDecision, LevelHandler};
use super::{AnnotatedLevel, Bbo, BookMetrics, BookState, PriceLevel, Side, UpdatedLevels};
use crate::parser::{DepthUpdate, Level};

/// Book whose level metadata is just the resting size
pub type PlainBook = BookBuilder<f64>;

/// Level handler that records a diff for each change
struct DiffRecorder<'a> {
    changes: &'a mut UpdatedLevels,
}

impl LevelHandler<f64> for DiffRecorder<'_> {
    fn create(&mut self, side: Side, level: PriceLevel) -> Option<f64> {
        if level.size > 0.0 {
            self.changes.side_mut(side).push(AnnotatedLevel {
                price: level.price,
                previous_size: 0.0,
                current_size: level.size,
            });
            Some(level.size)
        } else {
            debug!(?side, price = level.price, "Discarding zero-size level for unknown price");
            None
        }
    }

    fn update(&mut self, side: Side, level: PriceLevel, size: &mut f64) -> LevelDecision {
        self.changes.side_mut(side).push(AnnotatedLevel {
            price: level.price,
            previous_size: *size,
            current_size: level.size,
        });
        *size = level.size;

        if level.size == 0.0 {
            LevelDecision::Discard
        } else {
            LevelDecision::Keep
        }
    }
}

/// Book for a single symbol plus the diff of its last update
#[derive(Debug, Clone, Default)]
pub struct BookUpdater {
    book: PlainBook,
    changes: UpdatedLevels,
    bbo: Option<Bbo>,
    last_update_ns: u64,
}

impl BookUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply bid and ask level updates, returning the resulting BBO
    pub fn apply_depth_diff(&mut self, bids: &[Level], asks: &[Level]) -> Option<Bbo> {
        self.changes.clear();

        let mut recorder = DiffRecorder {
            changes: &mut self.changes,
        };
        self.book.update_levels(bids, asks, &mut recorder);

        self.bbo = self.book.compute_bbo();
        if let Some(bbo) = self.bbo.filter(Bbo::is_crossed) {
            warn!(bid = bbo.bid.price, ask = bbo.ask.price, "Crossed book");
        }
        self.bbo
    }

    /// Apply a depth message received at `timestamp_ns`
    pub fn on_depth(&mut self, timestamp_ns: u64, update: &DepthUpdate) -> Option<Bbo> {
        self.last_update_ns = timestamp_ns;
        self.apply_depth_diff(&update.bids, &update.asks)
    }

    pub fn compute_bbo(&self) -> Option<Bbo> {
        self.book.compute_bbo()
    }

    /// BBO after the last update
    pub fn bbo(&self) -> Option<Bbo> {
        self.bbo
    }

    /// Diff records of the last update
    pub fn updates(&self) -> &UpdatedLevels {
        &self.changes
    }

    pub fn book(&self) -> &PlainBook {
        &self.book
    }

    pub fn last_update_ns(&self) -> u64 {
        self.last_update_ns
    }

    pub fn metrics(&self) -> BookMetrics {
        BookMetrics::from_book(&self.book)
    }

    /// Snapshot of the top `depth` levels per side
    pub fn state(&self, symbol: &str, depth: usize) -> BookState {
        BookState {
            symbol: symbol.to_string(),
            timestamp_ns: self.last_update_ns,
            bids: self
                .book
                .bid_levels()
                .take(depth)
                .map(|(price, size)| PriceLevel::new(price, *size))
                .collect(),
            asks: self
                .book
                .ask_levels()
                .take(depth)
                .map(|(price, size)| PriceLevel::new(price, *size))
                .collect(),
            metrics: self.metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(raw: &[(f64, f64)]) -> Vec<Level> {
        raw.iter().map(|&(price, size)| Level::new(price, size)).collect()
    }

    fn book_levels(book: &BookUpdater) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        (
            book.book().bid_levels().map(|(p, s)| (p, *s)).collect(),
            book.book().ask_levels().map(|(p, s)| (p, *s)).collect(),
        )
    }

    fn annotated(price: f64, previous_size: f64, current_size: f64) -> AnnotatedLevel {
        AnnotatedLevel {
            price,
            previous_size,
            current_size,
        }
    }

    #[test]
    fn test_empty_update() {
        let mut book = BookUpdater::new();
        assert!(book.apply_depth_diff(&[], &[]).is_none());
        assert!(book.updates().is_empty());
    }

    #[test]
    fn test_just_one_bid() {
        let mut book = BookUpdater::new();
        assert!(book.apply_depth_diff(&levels(&[(1.0, 10.0)]), &[]).is_none());

        assert_eq!(book_levels(&book), (vec![(1.0, 10.0)], vec![]));
        assert_eq!(book.updates().bids, vec![annotated(1.0, 0.0, 10.0)]);
        assert!(book.updates().asks.is_empty());
    }

    #[test]
    fn test_book_example_bbo_and_delete() {
        let mut book = BookUpdater::new();
        let bbo = book
            .apply_depth_diff(
                &levels(&[(0.5, 5.9), (0.3, 3.4)]),
                &levels(&[(1.0, 10.0), (0.9, 11.1)]),
            )
            .unwrap();

        assert_eq!(bbo.bid, PriceLevel::new(0.5, 5.9));
        assert_eq!(bbo.ask, PriceLevel::new(0.9, 11.1));
        assert_eq!(
            book.updates().asks,
            vec![annotated(1.0, 0.0, 10.0), annotated(0.9, 0.0, 11.1)]
        );

        let bbo = book.apply_depth_diff(&levels(&[(0.5, 0.0)]), &[]).unwrap();
        assert_eq!(bbo.bid, PriceLevel::new(0.3, 3.4));
        assert_eq!(bbo.ask, PriceLevel::new(0.9, 11.1));
        assert_eq!(book.updates().bids, vec![annotated(0.5, 5.9, 0.0)]);
        assert!(book.updates().asks.is_empty());
    }

    #[test]
    fn test_zero_size_for_unknown_price_is_ignored() {
        let mut book = BookUpdater::new();
        book.apply_depth_diff(&levels(&[(2.0, 0.0)]), &levels(&[(3.0, 0.0)]));

        assert_eq!(book_levels(&book), (vec![], vec![]));
        assert!(book.updates().is_empty());
    }

    #[test]
    fn test_deleting_last_bid_clears_bbo() {
        let mut book = BookUpdater::new();
        book.apply_depth_diff(&levels(&[(1.0, 1.0)]), &levels(&[(2.0, 1.0)]));
        assert!(book.bbo().is_some());

        assert!(book.apply_depth_diff(&levels(&[(1.0, 0.0)]), &[]).is_none());
        assert!(book.bbo().is_none());
    }

    #[test]
    fn test_size_change_records_previous() {
        let mut book = BookUpdater::new();
        book.apply_depth_diff(&[], &levels(&[(2.0, 1.0)]));
        book.apply_depth_diff(&[], &levels(&[(2.0, 4.5), (2.5, 1.0)]));

        assert_eq!(
            book.updates().asks,
            vec![annotated(2.0, 1.0, 4.5), annotated(2.5, 0.0, 1.0)]
        );
        assert_eq!(book_levels(&book).1, vec![(2.0, 4.5), (2.5, 1.0)]);
    }

    #[test]
    fn test_diffs_reconstruct_book() {
        let mut book = BookUpdater::new();
        let mut mirror: std::collections::BTreeMap<i64, f64> = Default::default();
        let mut seed = 3u64;

        for _ in 0..200 {
            let mut bids = Vec::new();
            for _ in 0..4 {
                seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let price = ((seed >> 33) % 20) as f64;
                let size = if (seed >> 20) % 3 == 0 { 0.0 } else { ((seed >> 40) % 50) as f64 };
                bids.push(Level::new(price, size));
            }

            book.apply_depth_diff(&bids, &[]);

            for diff in &book.updates().bids {
                let key = diff.price as i64;
                assert_eq!(mirror.get(&key).copied().unwrap_or(0.0), diff.previous_size);
                if diff.current_size == 0.0 {
                    mirror.remove(&key);
                } else {
                    mirror.insert(key, diff.current_size);
                }
            }

            let current: Vec<(f64, f64)> = book.book().bid_levels().map(|(p, s)| (p, *s)).collect();
            let expected: Vec<(f64, f64)> =
                mirror.iter().rev().map(|(&p, &s)| (p as f64, s)).collect();
            assert_eq!(current, expected);
        }
    }

    #[test]
    fn test_state_snapshot() {
        let mut book = BookUpdater::new();
        book.on_depth(
            42,
            &DepthUpdate {
                bids: levels(&[(10.0, 1.0), (9.0, 2.0), (8.0, 3.0)]),
                asks: levels(&[(11.0, 1.0)]),
                exchange_time_us: 0,
            },
        );

        let state = book.state("BTCUSDT", 2);
        assert_eq!(state.timestamp_ns, 42);
        assert_eq!(state.bids.len(), 2);
        assert_eq!(state.bids[0].price, 10.0);
        assert_eq!(state.metrics.bid_levels, 3);
    }
}

//! Order book manager
//!
//! Keeps one book per replayed symbol, keyed by its token id.

use std::collections::HashMap;

use super::{Bbo, BookState, BookUpdater, UpdatedLevels};
use crate::parser::DepthUpdate;
use crate::replay::Tid;

/// Manages order books for multiple symbols
#[derive(Debug, Default)]
pub struct BookManager {
    books: HashMap<Tid, BookUpdater>,
    max_depth: usize,
}

impl BookManager {
    pub fn new() -> Self {
        Self::with_depth(20)
    }

    /// Create with custom snapshot depth
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            books: HashMap::new(),
            max_depth,
        }
    }

    /// Book for `tid`, created empty on first use
    pub fn get_or_create(&mut self, tid: Tid) -> &mut BookUpdater {
        self.books.entry(tid).or_default()
    }

    /// Apply a depth update to the book of `tid`
    pub fn apply(&mut self, tid: Tid, timestamp_ns: u64, update: &DepthUpdate) -> Option<Bbo> {
        self.get_or_create(tid).on_depth(timestamp_ns, update)
    }

    pub fn get(&self, tid: Tid) -> Option<&BookUpdater> {
        self.books.get(&tid)
    }

    pub fn bbo(&self, tid: Tid) -> Option<Bbo> {
        self.books.get(&tid).and_then(BookUpdater::bbo)
    }

    /// Diff of the last update applied to `tid`
    pub fn updates(&self, tid: Tid) -> Option<&UpdatedLevels> {
        self.books.get(&tid).map(BookUpdater::updates)
    }

    /// Snapshot of a book, labelled with `symbol`
    pub fn state(&self, tid: Tid, symbol: &str) -> Option<BookState> {
        self.books
            .get(&tid)
            .map(|book| book.state(symbol, self.max_depth))
    }

    /// Tracked token ids in ascending order
    pub fn tids(&self) -> Vec<Tid> {
        let mut tids: Vec<Tid> = self.books.keys().copied().collect();
        tids.sort_unstable();
        tids
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Level;

    fn depth(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> DepthUpdate {
        DepthUpdate {
            bids: bids.iter().map(|&(p, s)| Level::new(p, s)).collect(),
            asks: asks.iter().map(|&(p, s)| Level::new(p, s)).collect(),
            exchange_time_us: 0,
        }
    }

    #[test]
    fn test_books_are_independent() {
        let mut manager = BookManager::new();
        manager.apply(0, 10, &depth(&[(1.0, 1.0)], &[(2.0, 1.0)]));
        manager.apply(1, 11, &depth(&[(100.0, 5.0)], &[]));

        assert_eq!(manager.bbo(0).map(|b| b.mid()), Some(1.5));
        assert!(manager.bbo(1).is_none());
        assert_eq!(manager.tids(), vec![0, 1]);
        assert_eq!(manager.get(1).map(BookUpdater::last_update_ns), Some(11));
    }

    #[test]
    fn test_state_depth_limit() {
        let mut manager = BookManager::with_depth(1);
        manager.apply(3, 5, &depth(&[(1.0, 1.0), (0.5, 1.0)], &[(2.0, 1.0)]));

        let state = manager.state(3, "ETHUSDT").unwrap();
        assert_eq!(state.symbol, "ETHUSDT");
        assert_eq!(state.bids.len(), 1);
        assert!(manager.state(4, "X").is_none());
    }

    #[test]
    fn test_updates_track_last_message() {
        let mut manager = BookManager::new();
        manager.apply(0, 1, &depth(&[(1.0, 1.0)], &[]));
        manager.apply(0, 2, &depth(&[], &[(3.0, 2.0)]));

        let updates = manager.updates(0).unwrap();
        assert!(updates.bids.is_empty());
        assert_eq!(updates.asks.len(), 1);
    }
}

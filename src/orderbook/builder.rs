//! Sorted price-level maps with attached per-level metadata
//!
//! Uses BTreeMap keyed so that the first entry on each side is the best
//! price: `Reverse` for bids (highest first), plain for asks (lowest first).
//! Levels are created, updated and discarded through a [`LevelHandler`], so
//! one map lookup both maintains the book and computes side effects.

use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use super::{Bbo, PriceLevel, Side};
use crate::parser::Level;

/// Outcome of updating an existing level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelDecision {
    Keep,
    Discard,
}

/// Create/update protocol for book levels
pub trait LevelHandler<M> {
    /// Metadata for a price not yet in the book; `None` discards the level
    fn create(&mut self, side: Side, level: PriceLevel) -> Option<M>;

    /// Update existing metadata in place
    fn update(&mut self, side: Side, level: PriceLevel, meta: &mut M) -> LevelDecision;
}

/// [`LevelHandler`] from a pair of closures that share no state
pub struct FnLevelHandler<C, U> {
    creator: C,
    updater: U,
}

impl<C, U> FnLevelHandler<C, U> {
    pub fn new<M>(creator: C, updater: U) -> Self
    where
        C: FnMut(Side, PriceLevel) -> Option<M>,
        U: FnMut(Side, PriceLevel, &mut M) -> LevelDecision,
    {
        Self { creator, updater }
    }
}

impl<M, C, U> LevelHandler<M> for FnLevelHandler<C, U>
where
    C: FnMut(Side, PriceLevel) -> Option<M>,
    U: FnMut(Side, PriceLevel, &mut M) -> LevelDecision,
{
    fn create(&mut self, side: Side, level: PriceLevel) -> Option<M> {
        (self.creator)(side, level)
    }

    fn update(&mut self, side: Side, level: PriceLevel, meta: &mut M) -> LevelDecision {
        (self.updater)(side, level, meta)
    }
}

/// Map key that orders prices best-first for one side
pub trait PriceKey: Ord + Copy {
    fn from_price(price: f64) -> Self;
    fn price(&self) -> f64;
}

impl PriceKey for OrderedFloat<f64> {
    fn from_price(price: f64) -> Self {
        OrderedFloat(price)
    }

    fn price(&self) -> f64 {
        self.0
    }
}

impl PriceKey for Reverse<OrderedFloat<f64>> {
    fn from_price(price: f64) -> Self {
        Reverse(OrderedFloat(price))
    }

    fn price(&self) -> f64 {
        (self.0).0
    }
}

/// Resting size carried by level metadata
pub trait LevelSize {
    fn size(&self) -> f64;
}

impl LevelSize for f64 {
    fn size(&self) -> f64 {
        *self
    }
}

/// One side of the book
#[derive(Debug, Clone)]
pub struct BookSide<K, M> {
    side: Side,
    levels: BTreeMap<K, M>,
}

impl<K: PriceKey, M> BookSide<K, M> {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Create, update or discard the level at `level.price`
    pub fn update_level<H: LevelHandler<M>>(&mut self, level: PriceLevel, handler: &mut H) {
        match self.levels.entry(K::from_price(level.price)) {
            Entry::Vacant(vacant) => {
                if let Some(meta) = handler.create(self.side, level) {
                    vacant.insert(meta);
                }
            }
            Entry::Occupied(mut occupied) => {
                if handler.update(self.side, level, occupied.get_mut()) == LevelDecision::Discard {
                    occupied.remove();
                }
            }
        }
    }

    pub fn update_levels<H: LevelHandler<M>>(&mut self, levels: &[Level], handler: &mut H) {
        for &level in levels {
            self.update_level(level.into(), handler);
        }
    }

    /// Best price and its metadata
    pub fn best(&self) -> Option<(f64, &M)> {
        self.levels
            .first_key_value()
            .map(|(key, meta)| (key.price(), meta))
    }

    /// Levels best-first
    pub fn iter(&self) -> impl Iterator<Item = (f64, &M)> + '_ {
        self.levels.iter().map(|(key, meta)| (key.price(), meta))
    }

    pub fn get(&self, price: f64) -> Option<&M> {
        self.levels.get(&K::from_price(price))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Two-sided book with metadata `M` on each level
#[derive(Debug, Clone)]
pub struct BookBuilder<M> {
    bids: BookSide<Reverse<OrderedFloat<f64>>, M>,
    asks: BookSide<OrderedFloat<f64>, M>,
}

impl<M> Default for BookBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> BookBuilder<M> {
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
        }
    }

    pub fn update_level<H: LevelHandler<M>>(&mut self, side: Side, level: PriceLevel, handler: &mut H) {
        match side {
            Side::Bid => self.bids.update_level(level, handler),
            Side::Ask => self.asks.update_level(level, handler),
        }
    }

    /// Apply a batch of bid then ask updates
    pub fn update_levels<H: LevelHandler<M>>(&mut self, bids: &[Level], asks: &[Level], handler: &mut H) {
        self.bids.update_levels(bids, handler);
        self.asks.update_levels(asks, handler);
    }

    pub fn bids(&self) -> &BookSide<Reverse<OrderedFloat<f64>>, M> {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide<OrderedFloat<f64>, M> {
        &self.asks
    }

    /// Bids from highest price down
    pub fn bid_levels(&self) -> impl Iterator<Item = (f64, &M)> + '_ {
        self.bids.iter()
    }

    /// Asks from lowest price up
    pub fn ask_levels(&self) -> impl Iterator<Item = (f64, &M)> + '_ {
        self.asks.iter()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

impl<M: LevelSize> BookBuilder<M> {
    /// BBO, defined only when both sides have levels
    pub fn compute_bbo(&self) -> Option<Bbo> {
        let (bid_price, bid_meta) = self.bids.best()?;
        let (ask_price, ask_meta) = self.asks.best()?;

        Some(Bbo {
            bid: PriceLevel::new(bid_price, bid_meta.size()),
            ask: PriceLevel::new(ask_price, ask_meta.size()),
        })
    }
}

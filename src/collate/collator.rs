//! K-way timestamp collator
//!
//! Merges many individually time-sorted sources into one stream ordered by
//! `local_timestamp_ns`. Each source contributes one pending element to an
//! [`InPlaceHeap`]; the source that produced the last returned element is
//! advanced lazily on the following call.

use tracing::debug;

use super::heap::{HeapOrder, InPlaceHeap, TopAction};
use crate::error::{ReplayError, Result};

/// Anything carrying a local receive timestamp
pub trait Timestamped {
    fn local_timestamp_ns(&self) -> u64;
}

impl<V> Timestamped for (u64, V) {
    fn local_timestamp_ns(&self) -> u64 {
        self.0
    }
}

/// Lazy, finite, time-sorted producer of elements
pub trait CollatorSource<T> {
    /// Next element, `None` once exhausted. Errors are fatal for the replay.
    fn next_element(&mut self) -> Result<Option<T>>;
}

impl<T, S: CollatorSource<T> + ?Sized> CollatorSource<T> for Box<S> {
    fn next_element(&mut self) -> Result<Option<T>> {
        (**self).next_element()
    }
}

/// Adapts any iterator into a source
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator> IterSource<I> {
    pub fn new<C: IntoIterator<IntoIter = I>>(items: C) -> Self {
        Self {
            iter: items.into_iter(),
        }
    }
}

impl<I: Iterator> CollatorSource<I::Item> for IterSource<I> {
    fn next_element(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }
}

pub type BoxedSource<'a, T> = Box<dyn CollatorSource<T> + 'a>;

/// One source's current head element
struct PendingSlot<'a, T> {
    timestamp_ns: u64,
    /// Taken by `next_element`; refilled on the following call
    element: Option<T>,
    source: BoxedSource<'a, T>,
}

/// Earliest pending timestamp on top
struct EarliestFirst;

impl<'a, T> HeapOrder<PendingSlot<'a, T>> for EarliestFirst {
    fn before(a: &PendingSlot<'a, T>, b: &PendingSlot<'a, T>) -> bool {
        a.timestamp_ns < b.timestamp_ns
    }
}

/// K-way merge of boxed sources
pub struct Collator<'a, T: Timestamped> {
    pending_queue: InPlaceHeap<PendingSlot<'a, T>, EarliestFirst>,
    recompute_top: bool,
}

impl<'a, T: Timestamped> Collator<'a, T> {
    /// Pull each source's first element; empty sources are dropped
    pub fn new<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = BoxedSource<'a, T>>,
    {
        let mut collator = Self {
            pending_queue: InPlaceHeap::new(),
            recompute_top: false,
        };

        for source in sources {
            collator.add_from_source(source)?;
        }

        Ok(collator)
    }

    fn add_from_source(&mut self, mut source: BoxedSource<'a, T>) -> Result<()> {
        match source.next_element()? {
            Some(element) => self.pending_queue.push(PendingSlot {
                timestamp_ns: element.local_timestamp_ns(),
                element: Some(element),
                source,
            }),
            None => {
                debug!("Dropping empty source");
                Ok(())
            }
        }
    }

    /// Advance the source whose element was handed out last call
    fn refill_top(&mut self) -> Result<()> {
        let evicted = self.pending_queue.try_operate_on_top(|pending| {
            match pending.source.next_element()? {
                Some(next) => {
                    pending.timestamp_ns = next.local_timestamp_ns();
                    pending.element = Some(next);
                    Ok::<_, ReplayError>(TopAction::Retain)
                }
                None => Ok(TopAction::Evict),
            }
        })?;

        if evicted.is_some() {
            debug!(remaining = self.pending_queue.size(), "Source exhausted");
        }
        Ok(())
    }

    /// Sources that still have elements pending
    pub fn active_sources(&self) -> usize {
        self.pending_queue.size()
    }

    /// Timestamp of the element the next call would return, if already known
    pub fn peek_timestamp(&self) -> Option<u64> {
        if self.recompute_top {
            return None;
        }
        self.pending_queue.top().map(|pending| pending.timestamp_ns)
    }
}

impl<'a, T: Timestamped> CollatorSource<T> for Collator<'a, T> {
    fn next_element(&mut self) -> Result<Option<T>> {
        // The top slot is refilled one call late so its element can be moved
        // out without touching the source that produced it.
        if self.recompute_top {
            self.refill_top()?;
        }

        let Some(pending) = self.pending_queue.top_mut() else {
            self.recompute_top = false;
            return Ok(None);
        };

        self.recompute_top = true;
        pending
            .element
            .take()
            .map(Some)
            .ok_or_else(|| ReplayError::Invariant("collator top slot was already drained".into()))
    }
}

impl<'a, T: Timestamped> Iterator for Collator<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().transpose()
    }
}

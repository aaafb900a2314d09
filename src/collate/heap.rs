//! Binary heap over arena handles
//!
//! The heap array only shuffles `ArenaHandle`s; values stay put in the
//! arena. `operate_on_top` lets a caller refill the top value in place and
//! re-sift once instead of paying for a pop followed by a push.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::marker::PhantomData;

use super::arena::{ArenaHandle, SlotArena};
use crate::error::Result;

/// Ordering injected into an [`InPlaceHeap`]
pub trait HeapOrder<T> {
    /// `true` when `a` belongs strictly closer to the top than `b`
    fn before(a: &T, b: &T) -> bool;
}

/// Smallest value on top
#[derive(Debug, Default)]
pub struct MinFirst;

impl<T: Ord> HeapOrder<T> for MinFirst {
    fn before(a: &T, b: &T) -> bool {
        a.cmp(b) == Ordering::Less
    }
}

/// Largest value on top
#[derive(Debug, Default)]
pub struct MaxFirst;

impl<T: Ord> HeapOrder<T> for MaxFirst {
    fn before(a: &T, b: &T) -> bool {
        a.cmp(b) == Ordering::Greater
    }
}

/// What `operate_on_top` does with the top value afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopAction {
    Retain,
    Evict,
}

/// Heap of arena-backed values
#[derive(Debug)]
pub struct InPlaceHeap<T, O = MinFirst> {
    alloc: SlotArena<T>,
    data: Vec<ArenaHandle>,
    _order: PhantomData<O>,
}

impl<T, O: HeapOrder<T>> Default for InPlaceHeap<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O: HeapOrder<T>> InPlaceHeap<T, O> {
    pub fn new() -> Self {
        Self::with_arena(SlotArena::new())
    }

    pub fn with_arena(alloc: SlotArena<T>) -> Self {
        Self {
            alloc,
            data: Vec::new(),
            _order: PhantomData,
        }
    }

    fn parent(index: usize) -> usize {
        (index - 1) / 2
    }

    fn first_child(index: usize) -> usize {
        1 + index * 2
    }

    fn before(&self, a: ArenaHandle, b: ArenaHandle) -> bool {
        O::before(&self.alloc[a], &self.alloc[b])
    }

    fn sift_down_from(&mut self, mut index: usize) {
        loop {
            let child_a = Self::first_child(index);
            if child_a >= self.data.len() {
                return;
            }
            let child_b = child_a + 1;

            let mut best = child_a;
            if child_b < self.data.len() && self.before(self.data[child_b], self.data[child_a]) {
                best = child_b;
            }

            if !self.before(self.data[best], self.data[index]) {
                return;
            }

            self.data.swap(index, best);
            index = best;
        }
    }

    fn sift_up_from(&mut self, mut index: usize) {
        while index > 0 {
            let parent = Self::parent(index);
            if !self.before(self.data[index], self.data[parent]) {
                return;
            }
            self.data.swap(index, parent);
            index = parent;
        }
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        let handle = self.alloc.allocate(value)?;
        self.data.push(handle);
        self.sift_up_from(self.data.len() - 1);
        Ok(())
    }

    /// Run `f` on the top value, then keep it (re-sifting) or evict it.
    /// Returns the evicted value, if any. No-op on an empty heap.
    pub fn operate_on_top<F>(&mut self, f: F) -> Option<T>
    where
        F: FnOnce(&mut T) -> TopAction,
    {
        match self.try_operate_on_top(|top| Ok::<_, Infallible>(f(top))) {
            Ok(evicted) => evicted,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`operate_on_top`](Self::operate_on_top). On error the
    /// heap is left as it was, apart from whatever `f` did to the top value.
    pub fn try_operate_on_top<F, E>(&mut self, f: F) -> std::result::Result<Option<T>, E>
    where
        F: FnOnce(&mut T) -> std::result::Result<TopAction, E>,
    {
        let Some(&top) = self.data.first() else {
            return Ok(None);
        };

        let action = f(&mut self.alloc[top])?;

        let evicted = match action {
            TopAction::Retain => None,
            TopAction::Evict => {
                let last = self.data.len() - 1;
                self.data.swap(0, last);
                self.data.pop();
                self.alloc.deallocate(top)
            }
        };

        self.sift_down_from(0);
        Ok(evicted)
    }

    pub fn pop(&mut self) -> Option<T> {
        self.operate_on_top(|_| TopAction::Evict)
    }

    pub fn top(&self) -> Option<&T> {
        self.data.first().map(|&handle| &self.alloc[handle])
    }

    pub fn top_mut(&mut self) -> Option<&mut T> {
        let handle = *self.data.first()?;
        self.alloc.get_mut(handle)
    }

    /// Apply `f` to every value, then restore heap order
    pub fn adjust_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        for &handle in &self.data {
            f(&mut self.alloc[handle]);
        }

        if self.data.len() > 1 {
            for index in (0..=Self::parent(self.data.len() - 1)).rev() {
                self.sift_down_from(index);
            }
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Arena slots ever created, including recycled ones
    pub fn slot_count(&self) -> usize {
        self.alloc.slot_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T, O: HeapOrder<T>>(heap: &mut InPlaceHeap<T, O>) -> Vec<T> {
        std::iter::from_fn(|| heap.pop()).collect()
    }

    #[test]
    fn test_min_heap_ordering() {
        let mut heap: InPlaceHeap<u64> = InPlaceHeap::new();
        for v in [5, 3, 9, 1, 7, 3, 8, 0, 2] {
            heap.push(v).unwrap();
        }

        assert_eq!(heap.top(), Some(&0));
        assert_eq!(drain(&mut heap), vec![0, 1, 2, 3, 3, 5, 7, 8, 9]);
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_max_heap_ordering() {
        let mut heap: InPlaceHeap<i32, MaxFirst> = InPlaceHeap::new();
        for v in [4, -1, 12, 6] {
            heap.push(v).unwrap();
        }
        assert_eq!(drain(&mut heap), vec![12, 6, 4, -1]);
    }

    #[test]
    fn test_retain_after_growing_top_resifts() {
        let mut heap: InPlaceHeap<u64> = InPlaceHeap::new();
        for v in [1, 4, 6] {
            heap.push(v).unwrap();
        }

        let evicted = heap.operate_on_top(|top| {
            *top = 5;
            TopAction::Retain
        });

        assert!(evicted.is_none());
        assert_eq!(heap.size(), 3);
        assert_eq!(drain(&mut heap), vec![4, 5, 6]);
    }

    #[test]
    fn test_evict_returns_value_and_recycles_slot() {
        let mut heap: InPlaceHeap<u64> = InPlaceHeap::new();
        heap.push(2).unwrap();
        heap.push(1).unwrap();

        assert_eq!(heap.operate_on_top(|_| TopAction::Evict), Some(1));
        heap.push(7).unwrap();

        assert_eq!(heap.slot_count(), 2);
        assert_eq!(drain(&mut heap), vec![2, 7]);
    }

    #[test]
    fn test_operate_on_empty_heap() {
        let mut heap: InPlaceHeap<u64> = InPlaceHeap::new();
        let mut called = false;
        heap.operate_on_top(|_| {
            called = true;
            TopAction::Evict
        });
        assert!(!called);
        assert!(heap.top().is_none());
    }

    #[test]
    fn test_try_operate_propagates_error() {
        let mut heap: InPlaceHeap<u64> = InPlaceHeap::new();
        heap.push(3).unwrap();

        let result: std::result::Result<Option<u64>, &str> =
            heap.try_operate_on_top(|_| Err("source failed"));
        assert_eq!(result, Err("source failed"));
        assert_eq!(heap.size(), 1);
    }

    #[test]
    fn test_adjust_all_restores_order() {
        let mut heap: InPlaceHeap<i64> = InPlaceHeap::new();
        for v in [1, 2, 3, 4, 5, 6] {
            heap.push(v).unwrap();
        }

        heap.adjust_all(|v| *v = -*v);
        assert_eq!(drain(&mut heap), vec![-6, -5, -4, -3, -2, -1]);
    }

    #[test]
    fn test_interleaved_push_pop_matches_sorted() {
        let mut heap: InPlaceHeap<u32> = InPlaceHeap::new();
        let mut reference = Vec::new();
        let mut seed = 17u32;

        for step in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let value = (seed >> 16) % 1000;
            heap.push(value).unwrap();
            reference.push(value);

            if step % 3 == 0 {
                reference.sort_unstable_by(|a, b| b.cmp(a));
                assert_eq!(heap.pop(), reference.pop());
            }
        }
    }
}

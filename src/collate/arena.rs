//! Slot arena with integer handles
//!
//! Values live in a dense slot vector and are addressed by a `u32` index.
//! Freed indices go on a free list and are handed out again before the
//! vector grows, so a handle stays valid until its own `deallocate` no
//! matter how the backing storage moves.

use std::ops::{Index, IndexMut};

use crate::error::{ReplayError, Result};

/// Opaque identity of one arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaHandle(u32);

impl ArenaHandle {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Index-addressed allocator with free-list reuse
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free_indices: Vec<u32>,
    max_slots: u32,
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self::with_max_slots(u32::MAX)
    }

    /// Arena whose index space ends at `max_slots`
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            max_slots,
        }
    }

    /// Store `value`, reusing a freed slot when one exists
    pub fn allocate(&mut self, value: T) -> Result<ArenaHandle> {
        if let Some(idx) = self.free_indices.pop() {
            self.slots[idx as usize] = Some(value);
            return Ok(ArenaHandle(idx));
        }

        if self.slots.len() >= self.max_slots as usize {
            return Err(ReplayError::ArenaExhausted {
                max_slots: self.max_slots,
            });
        }

        if self.slots.len() == self.slots.capacity() {
            // ~10% growth keeps steady-state overcommit small
            let extra = (self.slots.len() / 10).max(1);
            self.slots.reserve_exact(extra);
        }

        let idx = self.slots.len() as u32;
        self.slots.push(Some(value));
        Ok(ArenaHandle(idx))
    }

    /// Drop the value in place and recycle its index
    pub fn deallocate(&mut self, handle: ArenaHandle) -> Option<T> {
        let value = self.slots.get_mut(handle.0 as usize)?.take()?;
        self.free_indices.push(handle.0);
        Some(value)
    }

    pub fn get(&self, handle: ArenaHandle) -> Option<&T> {
        self.slots.get(handle.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: ArenaHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0 as usize)?.as_mut()
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots ever created (live + free)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl<T> Index<ArenaHandle> for SlotArena<T> {
    type Output = T;

    fn index(&self, handle: ArenaHandle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("arena handle {} is not allocated", handle.0),
        }
    }
}

impl<T> IndexMut<ArenaHandle> for SlotArena<T> {
    fn index_mut(&mut self, handle: ArenaHandle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("arena handle {} is not allocated", handle.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_get() {
        let mut arena = SlotArena::new();
        let a = arena.allocate("a").unwrap();
        let b = arena.allocate("b").unwrap();

        assert_eq!(arena[a], "a");
        assert_eq!(arena[b], "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_freed_index_is_reused() {
        let mut arena = SlotArena::new();
        let a = arena.allocate(1u64).unwrap();
        assert_eq!(arena.deallocate(a), Some(1));

        let b = arena.allocate(2u64).unwrap();
        assert_eq!(a.index(), b.index());
        assert_eq!(arena[b], 2);
        assert_eq!(arena.slot_count(), 1);
    }

    #[test]
    fn test_handles_survive_growth() {
        let mut arena = SlotArena::new();
        let first = arena.allocate(String::from("first")).unwrap();
        let handles: Vec<_> = (0..1000)
            .map(|i| arena.allocate(i.to_string()).unwrap())
            .collect();

        assert_eq!(arena[first], "first");
        assert_eq!(arena[handles[999]], "999");
    }

    #[test]
    fn test_slot_count_bounded_by_high_water_mark() {
        let mut arena = SlotArena::new();
        for round in 0..50u32 {
            let handles: Vec<_> = (0..8).map(|i| arena.allocate(round + i).unwrap()).collect();
            for handle in handles {
                arena.deallocate(handle);
            }
        }
        assert_eq!(arena.slot_count(), 8);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_double_deallocate_is_none() {
        let mut arena = SlotArena::new();
        let a = arena.allocate(5).unwrap();
        assert_eq!(arena.deallocate(a), Some(5));
        assert_eq!(arena.deallocate(a), None);
        assert!(arena.get(a).is_none());
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut arena = SlotArena::with_max_slots(2);
        arena.allocate(1).unwrap();
        let b = arena.allocate(2).unwrap();
        assert!(matches!(
            arena.allocate(3),
            Err(ReplayError::ArenaExhausted { max_slots: 2 })
        ));

        arena.deallocate(b);
        assert!(arena.allocate(4).is_ok());
    }
}

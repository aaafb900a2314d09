//! Collation module
//!
//! Arena-backed binary heap and the k-way merge built on top of it.

mod arena;
mod collator;
mod heap;

pub use arena::{ArenaHandle, SlotArena};
pub use collator::{BoxedSource, Collator, CollatorSource, IterSource, Timestamped};
pub use heap::{HeapOrder, InPlaceHeap, MaxFirst, MinFirst, TopAction};

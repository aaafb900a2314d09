//! Timer module
//!
//! Deferred, time-keyed callbacks drained by the replay loop between events.

mod handle;
mod queue;

pub use handle::{SharedTimerQueue, TimerHandle};
pub use queue::{TimerCall, TimerQueue};

//! Min-heap of timer calls keyed by fire time

use tracing::debug;

use crate::collate::{HeapOrder, InPlaceHeap};
use crate::error::Result;

/// A callback due at `fire_at_ns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCall<C> {
    pub fire_at_ns: u64,
    pub callback: C,
}

/// Soonest fire time on top
#[derive(Debug)]
pub struct SoonestFirst;

impl<C> HeapOrder<TimerCall<C>> for SoonestFirst {
    fn before(a: &TimerCall<C>, b: &TimerCall<C>) -> bool {
        a.fire_at_ns < b.fire_at_ns
    }
}

/// Queue of pending timer calls
#[derive(Debug)]
pub struct TimerQueue<C> {
    timer_events: InPlaceHeap<TimerCall<C>, SoonestFirst>,
    /// Set once the first `get_next_event` has moved early calls up to real time
    clamped: bool,
}

impl<C> Default for TimerQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimerQueue<C> {
    pub fn new() -> Self {
        Self {
            timer_events: InPlaceHeap::new(),
            clamped: false,
        }
    }

    pub fn add_event(&mut self, call: TimerCall<C>) -> Result<()> {
        self.timer_events.push(call)
    }

    pub fn peek_next_fire_time(&self) -> Option<u64> {
        self.timer_events.top().map(|call| call.fire_at_ns)
    }

    /// Pop the earliest call if it is due at `now`.
    ///
    /// The first invocation raises every queued call to at least `now`, so
    /// calls scheduled during setup (typically at 0) fire relative to the
    /// first real timestamp rather than the epoch.
    pub fn get_next_event(&mut self, now: u64) -> Option<TimerCall<C>> {
        if !self.clamped {
            self.clamped = true;
            let queued = self.timer_events.size();
            self.timer_events
                .adjust_all(|call| call.fire_at_ns = call.fire_at_ns.max(now));
            debug!(queued, now, "Clamped setup-time timer calls");
        }

        if self.peek_next_fire_time()? > now {
            return None;
        }

        self.timer_events.pop()
    }

    pub fn len(&self) -> usize {
        self.timer_events.size()
    }

    pub fn is_empty(&self) -> bool {
        self.timer_events.is_empty()
    }
}

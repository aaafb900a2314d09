//! Replay loop
//!
//! Pulls one message at a time from the collator, fires every timer due at
//! or before its timestamp, then dispatches it to its instrument's handler.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use super::callbacks::MdCallbacks;
use super::loader::TidMessage;
use super::stats::{ReplayStats, ReplaySummary};
use crate::collate::CollatorSource;
use crate::config::{ReplayConfig, TimerClock};
use crate::error::{ReplayError, Result};
use crate::timer::{SharedTimerQueue, TimerHandle, TimerQueue};

/// Timer callback; receives the replay time it fires at
pub type TimerCallback = Rc<dyn Fn(u64) -> Result<()>>;

/// Handle scheduling one callback on a driver's timer queue
pub type DriverTimerHandle = TimerHandle<TimerCallback>;

pub struct ReplayDriver {
    timers: SharedTimerQueue<TimerCallback>,
    clock: TimerClock,
    stats: ReplayStats,
    summary: ReplaySummary,
}

impl ReplayDriver {
    pub fn new(clock: TimerClock) -> Result<Self> {
        Ok(Self {
            timers: Rc::new(RefCell::new(TimerQueue::new())),
            clock,
            stats: ReplayStats::new()?,
            summary: ReplaySummary::default(),
        })
    }

    pub fn from_config(config: &ReplayConfig) -> Result<Self> {
        Self::new(config.timer_clock)
    }

    /// Handle that schedules `callback` on this driver's timer queue
    pub fn timer_handle<F>(&self, callback: F) -> DriverTimerHandle
    where
        F: Fn(u64) -> Result<()> + 'static,
    {
        let callback: TimerCallback = Rc::new(callback);
        TimerHandle::new(&self.timers, callback)
    }

    /// Fire every queued call due at `now`, returning how many fired.
    ///
    /// The queue is not borrowed while a callback runs, so callbacks may
    /// schedule further calls, including ones due immediately.
    pub fn drain_timers_up_to(&mut self, now: u64) -> Result<u64> {
        let mut fired = 0;
        loop {
            let next = {
                let mut timers = self.timers.try_borrow_mut().map_err(|_| {
                    ReplayError::Invariant("timer queue borrowed while draining".into())
                })?;
                timers.get_next_event(now)
            };
            let Some(call) = next else {
                break;
            };

            let fire_time = match self.clock {
                TimerClock::EventTime => now,
                TimerClock::ScheduledTime => call.fire_at_ns,
            };
            (call.callback)(fire_time)?;

            fired += 1;
            self.stats.record_timer();
        }

        self.summary.timers_fired += fired;
        Ok(fired)
    }

    /// Replay every message of `collator`, stopping at the first error
    pub fn replay_all<S>(
        &mut self,
        collator: &mut S,
        callbacks: &mut MdCallbacks<'_>,
    ) -> Result<ReplaySummary>
    where
        S: CollatorSource<TidMessage> + ?Sized,
    {
        info!(
            symbols = callbacks.symbology().n_symbols(),
            clock = ?self.clock,
            "Starting replay"
        );

        while let Some(msg) = collator.next_element()? {
            let ts = msg.local_timestamp_ns;
            if let Some(last) = self.summary.last_timestamp_ns.filter(|&last| ts < last) {
                return Err(ReplayError::Invariant(format!(
                    "Timestamp went backwards from {} to {} (tid {})",
                    last, ts, msg.key
                )));
            }

            self.drain_timers_up_to(ts)?;
            callbacks.handle_update(&msg)?;

            let category = msg.update.category();
            self.summary.record_event(ts, category);
            self.stats.record_event(category);
        }

        debug!(pending_timers = self.pending_timers()?, "Collator exhausted");
        info!(
            events = self.summary.events,
            trades = self.summary.trades,
            depth_updates = self.summary.depth_updates,
            timers_fired = self.summary.timers_fired,
            span_ns = self.summary.span_ns(),
            "Replay finished"
        );

        Ok(self.summary)
    }

    /// Timer calls still queued.
    ///
    /// Fails if the queue is mutably borrowed, e.g. from inside a timer callback.
    pub fn pending_timers(&self) -> Result<usize> {
        self.timers
            .try_borrow()
            .map(|timers| timers.len())
            .map_err(|_| ReplayError::Invariant("timer queue borrowed while counting".into()))
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }
}

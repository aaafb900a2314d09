//! Scheduling capability handed to components

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::queue::{TimerCall, TimerQueue};
use crate::error::{ReplayError, Result};

/// Timer queue shared between the replay loop and the handles it gives out
pub type SharedTimerQueue<C> = Rc<RefCell<TimerQueue<C>>>;

/// Schedules one fixed callback on a shared queue.
///
/// Scheduling again does not cancel an earlier call; callers that reschedule
/// keep their own "call pending" flag. The handle holds a weak reference so
/// a callback capturing its own handle does not keep the queue alive.
pub struct TimerHandle<C> {
    queue: Weak<RefCell<TimerQueue<C>>>,
    callback: C,
}

impl<C: Clone> TimerHandle<C> {
    pub fn new(queue: &SharedTimerQueue<C>, callback: C) -> Self {
        Self {
            queue: Rc::downgrade(queue),
            callback,
        }
    }

    pub fn schedule_call_at(&self, call_at_ns: u64) -> Result<()> {
        let queue = self
            .queue
            .upgrade()
            .ok_or_else(|| ReplayError::Invariant("timer queue dropped".into()))?;

        let mut queue = queue
            .try_borrow_mut()
            .map_err(|_| ReplayError::Invariant("timer queue borrowed while scheduling".into()))?;

        queue.add_event(TimerCall {
            fire_at_ns: call_at_ns,
            callback: self.callback.clone(),
        })
    }
}

impl<C: Clone> Clone for TimerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            callback: self.callback.clone(),
        }
    }
}

use std::time::{Duration, Instant};
use tracing::debug;

/// Identifies one scheduled action. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: TimerHandle,
    /// `None` when the delay is past the clock's range: never due.
    deadline: Option<Instant>,
    payload: T,
}

/// A single-slot deferred action. Scheduling always replaces (cancels) the
/// previous action, so at most one is pending at any time.
///
/// The timer never fires on its own: the owner polls `fire_due` from its
/// event loop, using `next_deadline` to know when to wake up.
#[derive(Debug)]
pub struct DelayTimer<T> {
    pending: Option<Pending<T>>,
    next_id: u64,
}

impl<T> Default for DelayTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayTimer<T> {
    pub fn new() -> Self {
        Self {
            pending: None,
            next_id: 0,
        }
    }

    /// Schedule `payload` to become due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TimerHandle {
        self.cancel_all();
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending = Some(Pending {
            handle,
            deadline: now.checked_add(delay),
            payload,
        });
        debug!(handle = handle.0, delay_ms = delay.as_millis() as u64, "timer scheduled");
        handle
    }

    /// Cancel `handle` if it is still the pending action. Returns whether
    /// anything was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.handle == handle) {
            self.pending = None;
            debug!(handle = handle.0, "timer cancelled");
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(handle = pending.handle.0, "timer cancelled");
        }
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and_then(|p| p.deadline)
    }

    /// Take the pending payload if its deadline has passed.
    pub fn fire_due(&mut self, now: Instant) -> Option<T> {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.deadline.is_some_and(|deadline| deadline <= now))
        {
            self.pending.take().map(|p| {
                debug!(handle = p.handle.0, "timer fired");
                p.payload
            })
        } else {
            None
        }
    }
}

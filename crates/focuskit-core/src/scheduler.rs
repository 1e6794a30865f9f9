//! Single-threaded timer queue with cancellable, identity-tagged timers.
//!
//! Every `schedule` call returns a [`TimerHandle`] stamped with the current
//! epoch. `invalidate_all` bumps the epoch and drops everything pending, so a
//! handle captured before a step change can never fire into the next step.

use std::collections::BTreeMap;

use crate::model::Millis;

/// What a timer means to the controller that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    ReactionGo,
    AttentionTick,
    AttentionHide,
    AttentionDeadline,
    MemoryTileOn,
    MemoryTileOff,
    MemoryNextLevel,
}

/// Identity of one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: u64,
    epoch: u64,
    deadline: Millis,
}

impl TimerHandle {
    pub fn deadline(&self) -> Millis {
        self.deadline
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// A timer taken off the queue, ready to be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    epoch: u64,
    next_id: u64,
    // Ordered by deadline, then by scheduling order for equal deadlines.
    pending: BTreeMap<(Millis, u64), TimerKind>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, now: Millis, delay_ms: Millis, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle {
            id: self.next_id,
            epoch: self.epoch,
            deadline: now.saturating_add(delay_ms),
        };
        self.next_id += 1;
        self.pending.insert((handle.deadline, handle.id), kind);
        handle
    }

    /// Cancel a pending timer. Returns `false` if it already fired, was
    /// cancelled, or belongs to an earlier epoch.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.is_stale(handle) {
            return false;
        }
        self.pending.remove(&(handle.deadline, handle.id)).is_some()
    }

    /// Drop every pending timer and start a new epoch. Returns how many were dropped.
    pub fn invalidate_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.epoch += 1;
        dropped
    }

    pub fn is_stale(&self, handle: TimerHandle) -> bool {
        handle.epoch != self.epoch
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// The earliest pending timer, without removing it.
    pub fn peek(&self) -> Option<FiredTimer> {
        self.pending
            .iter()
            .next()
            .map(|(&(deadline, id), &kind)| FiredTimer {
                handle: TimerHandle {
                    id,
                    epoch: self.epoch,
                    deadline,
                },
                kind,
            })
    }

    /// Remove and return the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<FiredTimer> {
        let next = self.peek()?;
        if next.handle.deadline > now {
            return None;
        }
        self.pending.remove(&(next.handle.deadline, next.handle.id));
        Some(next)
    }

    /// Take a specific timer off the queue for external dispatch.
    /// Fails for stale, cancelled or already-fired timers.
    pub fn claim(&mut self, timer: FiredTimer) -> bool {
        self.cancel(timer.handle)
    }
}

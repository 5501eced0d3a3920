//! The timeout queue.
//!
//! Timeouts are kept in a list ordered by expiry, each entry storing the
//! **delta** to its predecessor, so that announcing elapsed ticks only
//! ever touches the head of the list. The queue itself does not know the
//! current time; the [`NetTimeReference`] owns the relationship between
//! ticks and the counters, and drains the queue one entry at a time so
//! that expiry actions run with the queue lock released.
//!
//! [`NetTimeReference`]: super::reference::NetTimeReference

use core::task::Waker;

/// The tick value representing "never"; rejected by [`TimeoutQueue::add`].
pub const FOREVER_TICKS: u64 = u64::MAX;

/// What happens when a timeout expires.
#[derive(Debug, Clone)]
pub enum ExpiryAction {
    /// Call a function with an opaque token.
    Callback {
        /// The function to call.
        handler: fn(usize),
        /// The token passed to the handler.
        token: usize,
    },
    /// Wake a task.
    Wake(Waker),
}

impl ExpiryAction {
    /// Perform the action.
    pub fn fire(self) {
        match self {
            ExpiryAction::Callback { handler, token } => handler(token),
            ExpiryAction::Wake(waker) => waker.wake(),
        }
    }
}

/// A handle identifying a queued timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutId(u32);

/// An error from the timeout queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is full.
    Full,
    /// An infinite deadline cannot be queued.
    Forever,
}

#[derive(Debug, Clone)]
struct Entry {
    id: u32,
    /// Ticks after the expiry of the predecessor entry.
    delta: u64,
    /// Re-arm interval of a periodic timeout.
    period: Option<u64>,
    action: ExpiryAction,
}

/// A delta-ordered timeout queue with up to `N` pending entries.
#[derive(Debug)]
pub struct TimeoutQueue<const N: usize> {
    entries: heapless::Vec<Entry, N>,
    next_id: u32,
}

impl<const N: usize> TimeoutQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
            next_id: 0,
        }
    }

    /// Returns `true` when no timeout is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the number of pending timeouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Queue a timeout expiring `dt` ticks from the queue's current
    /// position. A `period` re-arms the timeout relative to each expiry.
    pub fn add(
        &mut self,
        dt: u64,
        period: Option<u64>,
        action: ExpiryAction,
    ) -> Result<TimeoutId, QueueError> {
        if dt == FOREVER_TICKS {
            return Err(QueueError::Forever);
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        // Walk the list, decrementing the requested delta, until an entry
        // with a larger remaining delta is found.
        let mut remaining = dt;
        let mut index = 0;
        for entry in self.entries.iter() {
            if entry.delta > remaining {
                break;
            }
            remaining -= entry.delta;
            index += 1;
        }

        self.entries
            .insert(
                index,
                Entry {
                    id,
                    delta: remaining,
                    period,
                    action,
                },
            )
            .map_err(|_| QueueError::Full)?;

        // The successor's delta is now relative to the new entry.
        if let Some(successor) = self.entries.get_mut(index + 1) {
            successor.delta -= remaining;
        }

        Ok(TimeoutId(id))
    }

    /// Cancel a pending timeout. Idempotent: returns `false` when the
    /// timeout is no longer queued.
    pub fn abort(&mut self, id: TimeoutId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id == id.0) else {
            return false;
        };

        let removed = self.entries.remove(index);
        if let Some(successor) = self.entries.get_mut(index) {
            successor.delta += removed.delta;
        }

        true
    }

    /// Return the delta of the head entry, the ticks until the next
    /// expiry.
    pub fn next_delta(&self) -> Option<u64> {
        self.entries.first().map(|e| e.delta)
    }

    /// Return the absolute position (sum of deltas) of a pending timeout.
    pub fn deadline_of(&self, id: TimeoutId) -> Option<u64> {
        let mut sum = 0;
        for entry in self.entries.iter() {
            sum += entry.delta;
            if entry.id == id.0 {
                return Some(sum);
            }
        }
        None
    }

    /// Consume up to `budget` ticks and pop the next due action, if any.
    ///
    /// When the head entry is due within the budget, the budget is reduced
    /// by the head's delta and the action is returned; the caller fires it
    /// with the lock released and calls again with the remaining budget.
    /// Otherwise the whole budget is absorbed into the queue position and
    /// `None` is returned. A periodic entry is re-armed relative to its
    /// expiry before the action is returned, so that chained deadlines
    /// stay deterministic.
    pub fn pop_due(&mut self, budget: &mut u64) -> Option<ExpiryAction> {
        let Some(head) = self.entries.first_mut() else {
            *budget = 0;
            return None;
        };

        if head.delta > *budget {
            head.delta -= *budget;
            *budget = 0;
            return None;
        }

        *budget -= head.delta;
        let entry = self.entries.remove(0);

        if let Some(period) = entry.period {
            // Cannot fail: a slot was just freed.
            let mut remaining = period;
            let mut index = 0;
            for e in self.entries.iter() {
                if e.delta > remaining {
                    break;
                }
                remaining -= e.delta;
                index += 1;
            }
            let _ = self.entries.insert(
                index,
                Entry {
                    id: entry.id,
                    delta: remaining,
                    period: entry.period,
                    action: entry.action.clone(),
                },
            );
            if let Some(successor) = self.entries.get_mut(index + 1) {
                successor.delta -= remaining;
            }
        }

        Some(entry.action)
    }
}

impl<const N: usize> Default for TimeoutQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

//! Cooperative one-shot timers on a logical clock.
//!
//! Nothing here sleeps or spawns: the owner asks for due timers with the
//! current logical time, so tests can jump straight to any instant.

use std::{collections::BTreeMap, time::Duration};

/// Handle returned by [`Timers::schedule`], used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct Timers<E> {
    next_id: u64,
    // keyed by (deadline, id) so equal deadlines fire in scheduling order
    pending: BTreeMap<(Duration, TimerId), E>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timers<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Arms `event` to fire `after` the logical instant `now`. A deadline past
    /// the end of logical time never comes due.
    pub fn schedule(&mut self, now: Duration, after: Duration, event: E) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert((now.saturating_add(after), id), event);
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, pending)| *pending == id).copied();
        key.and_then(|key| self.pending.remove(&key)).is_some()
    }

    /// Removes and returns the earliest timer whose deadline is not after `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, E)> {
        let (&(deadline, id), _) = self.pending.first_key_value()?;
        if deadline > now {
            return None;
        }
        self.pending.remove(&(deadline, id)).map(|event| (id, event))
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.keys().any(|(_, pending)| *pending == id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

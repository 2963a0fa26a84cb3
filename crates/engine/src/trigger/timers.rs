// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer heap with lazy cancellation

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A pending fire of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Timer {
    pub fire_at: DateTime<Utc>,
    /// Insertion order; breaks ties so same-instant timers pop FIFO
    seq: u64,
    pub job_id: String,
    /// Job generation the timer was armed for
    pub generation: u64,
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first
        Reverse((self.fire_at, self.seq)).cmp(&Reverse((other.fire_at, other.seq)))
    }
}

/// Timers ordered by fire time.
///
/// Every timer carries the generation of the job it was armed for. The
/// engine purges a job's timers when the job is removed or rescheduled, and
/// still skips any popped timer whose generation is not current.
#[derive(Debug, Default)]
pub(crate) struct TimerHeap {
    items: BinaryHeap<Timer>,
    next_seq: u64,
}

impl TimerHeap {
    pub fn push(&mut self, job_id: &str, generation: u64, fire_at: DateTime<Utc>) {
        self.next_seq += 1;
        self.items.push(Timer {
            fire_at,
            seq: self.next_seq,
            job_id: job_id.to_string(),
            generation,
        });
    }

    /// Pop the earliest timer if it is due at `now`
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<Timer> {
        if self.items.peek()?.fire_at <= now {
            self.items.pop()
        } else {
            None
        }
    }

    /// Earliest armed fire time, stale timers included
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.items.peek().map(|t| t.fire_at)
    }

    /// Drop timers the predicate rejects
    pub fn retain(&mut self, mut live: impl FnMut(&Timer) -> bool) {
        self.items.retain(|t| live(t));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

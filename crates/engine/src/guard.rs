// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At most one in-flight execution per watch

use crate::stats::CurrentExecution;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use wx_core::ExecutionPhase;

type Current = Arc<Mutex<HashMap<String, CurrentExecution>>>;

#[derive(Clone, Default)]
pub(crate) struct InFlightGuard {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    current: Current,
    queued: Arc<AtomicUsize>,
}

/// Exclusive right to execute one watch; released on drop
pub(crate) struct WatchLease {
    watch_id: String,
    current: Current,
    _lock: OwnedMutexGuard<()>,
}

impl InFlightGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, watch_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = lock(&self.locks);
        Arc::clone(locks.entry(watch_id.to_string()).or_default())
    }

    /// Claim the watch without waiting
    pub(crate) fn try_acquire(&self, watch_id: &str) -> Option<WatchLease> {
        let guard = self.lock_for(watch_id).try_lock_owned().ok()?;
        Some(self.lease(watch_id, guard))
    }

    /// Claim the watch, waiting up to `wait` for an in-flight execution
    pub(crate) async fn acquire(&self, watch_id: &str, wait: Duration) -> Option<WatchLease> {
        if let Some(lease) = self.try_acquire(watch_id) {
            return Some(lease);
        }

        let mutex = self.lock_for(watch_id);
        self.queued.fetch_add(1, Ordering::Relaxed);
        let outcome = tokio::time::timeout(wait, mutex.lock_owned()).await;
        self.queued.fetch_sub(1, Ordering::Relaxed);
        outcome.ok().map(|guard| self.lease(watch_id, guard))
    }

    fn lease(&self, watch_id: &str, guard: OwnedMutexGuard<()>) -> WatchLease {
        WatchLease {
            watch_id: watch_id.to_string(),
            current: Arc::clone(&self.current),
            _lock: guard,
        }
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// In-flight executions, oldest first
    pub(crate) fn current(&self) -> Vec<CurrentExecution> {
        let mut current: Vec<CurrentExecution> = lock(&self.current).values().cloned().collect();
        current.sort_by(|a, b| a.started.cmp(&b.started).then_with(|| a.watch_id.cmp(&b.watch_id)));
        current
    }

    /// Drop the lock entry of a deleted watch unless someone still holds it
    pub(crate) fn forget(&self, watch_id: &str) {
        let mut locks = lock(&self.locks);
        if locks.get(watch_id).is_some_and(|m| Arc::strong_count(m) == 1) {
            locks.remove(watch_id);
        }
    }
}

impl WatchLease {
    pub(crate) fn begin(&self, execution_id: &str, started: DateTime<Utc>) {
        lock(&self.current).insert(
            self.watch_id.clone(),
            CurrentExecution {
                watch_id: self.watch_id.clone(),
                execution_id: execution_id.to_string(),
                started,
                phase: ExecutionPhase::Started,
            },
        );
    }

    pub(crate) fn set_phase(&self, phase: ExecutionPhase) {
        if let Some(entry) = lock(&self.current).get_mut(&self.watch_id) {
            entry.phase = phase;
        }
    }
}

impl Drop for WatchLease {
    fn drop(&mut self) {
        lock(&self.current).remove(&self.watch_id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_while_leased() {
        let guard = InFlightGuard::new();
        let lease = guard.try_acquire("w").unwrap();
        assert!(guard.try_acquire("w").is_none());
        assert!(guard.try_acquire("other").is_some());

        drop(lease);
        assert!(guard.try_acquire("w").is_some());
    }

    #[test]
    fn current_tracks_phase_until_drop() {
        let guard = InFlightGuard::new();
        let started = chrono::Utc::now();
        let lease = guard.try_acquire("w").unwrap();
        lease.begin("exec-1", started);
        lease.set_phase(ExecutionPhase::Actions);

        let current = guard.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].execution_id, "exec-1");
        assert_eq!(current[0].phase, ExecutionPhase::Actions);
        assert_eq!(current[0].watch_id, "w");

        drop(lease);
        assert!(guard.current().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_claim_succeeds_after_release() {
        let guard = InFlightGuard::new();
        let lease = guard.try_acquire("w").unwrap();

        let waiter = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.acquire("w", Duration::from_secs(5)).await.is_some() })
        };
        tokio::task::yield_now().await;
        assert_eq!(guard.queued(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(lease);
        assert!(waiter.await.unwrap());
        assert_eq!(guard.queued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_claim_times_out() {
        let guard = InFlightGuard::new();
        let _lease = guard.try_acquire("w").unwrap();
        assert!(guard.acquire("w", Duration::from_millis(100)).await.is_none());
    }

    #[test]
    fn forget_keeps_held_locks() {
        let guard = InFlightGuard::new();
        let lease = guard.try_acquire("w").unwrap();
        guard.forget("w");
        assert!(guard.try_acquire("w").is_none());

        drop(lease);
        guard.forget("w");
        assert!(lock(&guard.locks).is_empty());
    }
}

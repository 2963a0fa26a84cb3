// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger engine: one timer per scheduled job, fanned out to listeners
//!
//! A single driver task sleeps until the earliest timer, pops every due
//! timer, re-arms each job from its *intended* fire time and delivers the
//! events to listeners in registration order. Ticks missed while the driver
//! was late are fired one by one, so interval schedules never drift.

mod timers;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use thiserror::Error;
use timers::TimerHeap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use wx_core::{Clock, Schedule, ScheduleError, ScheduleZone, TriggerEvent};

/// Upper bound on timers handled per driver pass before yielding
const MAX_BATCH: usize = 1024;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("cannot schedule job {job_id}: {source}")]
    Schedule {
        job_id: String,
        #[source]
        source: ScheduleError,
    },
    #[error("timer callbacks still running after {0:?}")]
    StopTimeout(Duration),
}

/// A job to schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerJob {
    pub id: String,
    pub schedule: Schedule,
}

impl TriggerJob {
    pub fn new(id: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            schedule,
        }
    }
}

/// Receives trigger events. Called synchronously from the driver, so
/// implementations hand real work off instead of running it inline.
pub trait TriggerListener: Send + Sync + 'static {
    fn on_trigger(&self, event: &TriggerEvent);

    /// A job was dropped because its next fire time could not be computed
    fn on_error(&self, job_id: &str, error: &ScheduleError) {
        let _ = (job_id, error);
    }
}

struct Job {
    schedule: Schedule,
    generation: u64,
    next_fire: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    jobs: HashMap<String, Job>,
    timers: TimerHeap,
    next_generation: u64,
    running: bool,
    driver: Option<JoinHandle<()>>,
}

struct Shared<C> {
    clock: C,
    zone: ScheduleZone,
    state: Mutex<State>,
    listeners: RwLock<Vec<Arc<dyn TriggerListener>>>,
    wake: Notify,
}

/// Due events and dropped jobs from one driver pass
#[derive(Default)]
struct Fired {
    events: Vec<TriggerEvent>,
    failures: Vec<(String, ScheduleError)>,
}

#[derive(Clone)]
pub struct TriggerEngine<C: Clock> {
    shared: Arc<Shared<C>>,
}

impl<C: Clock> TriggerEngine<C> {
    pub fn new(clock: C, zone: ScheduleZone) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                zone,
                state: Mutex::new(State::default()),
                listeners: RwLock::new(Vec::new()),
                wake: Notify::new(),
            }),
        }
    }

    /// Start the driver and register `jobs`.
    ///
    /// Jobs that are already registered keep their current timer; nothing is
    /// removed. Jobs whose first fire time cannot be computed are skipped and
    /// returned as errors.
    pub fn start(&self, jobs: impl IntoIterator<Item = TriggerJob>) -> Vec<TriggerError> {
        {
            let mut state = self.shared.lock();
            state.running = true;
            if state.driver.is_none() {
                state.driver = Some(tokio::spawn(drive(Arc::clone(&self.shared))));
            }
        }

        let mut errors = Vec::new();
        for job in jobs {
            if self.shared.lock().jobs.contains_key(&job.id) {
                continue;
            }
            if let Err(e) = self.add(job) {
                errors.push(e);
            }
        }
        errors
    }

    /// Schedule a job, replacing an existing job with a different schedule.
    ///
    /// Returns false when the job was already scheduled identically.
    pub fn add(&self, job: TriggerJob) -> Result<bool, TriggerError> {
        let now = self.shared.clock.now();
        let mut state = self.shared.lock();

        if let Some(existing) = state.jobs.get(&job.id) {
            if existing.schedule == job.schedule {
                return Ok(false);
            }
        }

        let next_fire = job
            .schedule
            .next_fire_time(now, &self.shared.zone)
            .map_err(|source| TriggerError::Schedule {
                job_id: job.id.clone(),
                source,
            })?;

        state.next_generation += 1;
        let generation = state.next_generation;
        // Drop the replaced schedule's timer so churn can't grow the heap
        state
            .timers
            .retain(|t| t.job_id != job.id || t.generation == generation);
        state.timers.push(&job.id, generation, next_fire);
        tracing::debug!(
            job_id = %job.id,
            schedule = %job.schedule.describe(),
            next_fire = %next_fire,
            "job scheduled"
        );
        state.jobs.insert(
            job.id,
            Job {
                schedule: job.schedule,
                generation,
                next_fire,
            },
        );
        drop(state);

        self.shared.wake.notify_one();
        Ok(true)
    }

    /// Cancel a job. Unknown ids are a no-op.
    pub fn remove(&self, job_id: &str) -> bool {
        let mut state = self.shared.lock();
        let removed = state.jobs.remove(job_id).is_some();
        if removed {
            state.timers.retain(|t| t.job_id != job_id);
            tracing::debug!(job_id, "job removed");
        }
        removed
    }

    pub fn add_listener(&self, listener: Arc<dyn TriggerListener>) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Fire a registered job immediately, outside its schedule.
    ///
    /// Delivery happens on the calling task. Returns false for unknown jobs.
    pub fn fire_now(&self, job_id: &str) -> bool {
        if !self.shared.lock().jobs.contains_key(job_id) {
            return false;
        }
        let event = TriggerEvent::manual(job_id, self.shared.clock.now());
        self.shared.deliver(&Fired {
            events: vec![event],
            failures: Vec::new(),
        });
        true
    }

    /// Cancel every timer and wait, up to `timeout`, for the driver to finish
    /// delivering whatever it is delivering.
    pub async fn stop(&self, timeout: Duration) -> Result<(), TriggerError> {
        let driver = {
            let mut state = self.shared.lock();
            state.running = false;
            state.jobs.clear();
            state.timers.clear();
            state.driver.take()
        };
        self.shared.wake.notify_one();

        if let Some(driver) = driver {
            let abort = driver.abort_handle();
            if tokio::time::timeout(timeout, driver).await.is_err() {
                abort.abort();
                tracing::warn!(?timeout, "trigger driver did not stop in time");
                return Err(TriggerError::StopTimeout(timeout));
            }
        }
        tracing::info!("trigger engine stopped");
        Ok(())
    }

    pub fn job_count(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn is_scheduled(&self, job_id: &str) -> bool {
        self.shared.lock().jobs.contains_key(job_id)
    }

    pub fn next_fire(&self, job_id: &str) -> Option<DateTime<Utc>> {
        self.shared.lock().jobs.get(job_id).map(|j| j.next_fire)
    }
}

impl<C: Clock> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pop due timers and re-arm their jobs from the intended fire time
    fn collect_due(&self, now: DateTime<Utc>) -> (Fired, Option<DateTime<Utc>>) {
        let mut state = self.lock();
        let State { jobs, timers, .. } = &mut *state;
        let mut fired = Fired::default();

        while fired.events.len() < MAX_BATCH {
            let Some(timer) = timers.pop_due(now) else {
                break;
            };
            let Some(job) = jobs.get_mut(&timer.job_id) else {
                continue;
            };
            if job.generation != timer.generation {
                continue;
            }

            fired
                .events
                .push(TriggerEvent::scheduled(&timer.job_id, timer.fire_at, now));

            match job.schedule.next_fire_time(timer.fire_at, &self.zone) {
                Ok(next) => {
                    job.next_fire = next;
                    timers.push(&timer.job_id, job.generation, next);
                }
                Err(e) => {
                    jobs.remove(&timer.job_id);
                    fired.failures.push((timer.job_id, e));
                }
            }
        }

        (fired, timers.next_deadline())
    }

    /// Deliver to every listener in registration order; a panicking listener
    /// is logged and skipped
    fn deliver(&self, fired: &Fired) {
        let listeners: Vec<Arc<dyn TriggerListener>> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for event in &fired.events {
            tracing::debug!(
                job_id = %event.job_id,
                scheduled_time = %event.scheduled_time,
                kind = ?event.kind,
                "trigger fired"
            );
            for (index, listener) in listeners.iter().enumerate() {
                let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_trigger(event)));
                if outcome.is_err() {
                    tracing::error!(job_id = %event.job_id, listener = index, "trigger listener panicked");
                }
            }
        }

        for (job_id, error) in &fired.failures {
            tracing::error!(job_id = %job_id, error = %error, "job dropped: cannot compute next fire time");
            for listener in &listeners {
                let outcome = catch_unwind(AssertUnwindSafe(|| listener.on_error(job_id, error)));
                if outcome.is_err() {
                    tracing::error!(job_id = %job_id, "trigger listener panicked in on_error");
                }
            }
        }
    }
}

async fn drive<C: Clock>(shared: Arc<Shared<C>>) {
    tracing::info!("trigger engine started");
    loop {
        if !shared.lock().running {
            break;
        }

        let (fired, deadline) = shared.collect_due(shared.clock.now());
        shared.deliver(&fired);

        let now = shared.clock.now();
        match deadline {
            Some(at) if at <= now => tokio::task::yield_now().await,
            Some(at) => {
                let wait = (at - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shared.wake.notified() => {}
                }
            }
            None => shared.wake.notified().await,
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;

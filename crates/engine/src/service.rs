// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control surface: the trigger engine and execution runner behind one API

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::runner::{ExecutionRunner, RunnerDeps};
use crate::stats::{EngineStats, WatchView};
use crate::trigger::{TriggerEngine, TriggerError, TriggerJob};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wx_adapters::{DataSource, FeatureGate, HistorySink, ScriptEngine, WatchRegistry};
use wx_core::{AckReport, Clock, ExecuteRequest, ExecutionRecord, IdGen, RecordState, Watch};
use wx_watch::{parse_watch, validate_watch, Format, ParseError};

pub struct WatchService<R, D, E, H, G, C: Clock, I> {
    runner: ExecutionRunner<R, D, E, H, G, C, I>,
    triggers: TriggerEngine<C>,
    listening: Arc<AtomicBool>,
}

impl<R, D, E, H, G, C: Clock, I> Clone for WatchService<R, D, E, H, G, C, I> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            triggers: self.triggers.clone(),
            listening: Arc::clone(&self.listening),
        }
    }
}

impl<R, D, E, H, G, C, I> WatchService<R, D, E, H, G, C, I>
where
    R: WatchRegistry,
    D: DataSource,
    E: ScriptEngine,
    H: HistorySink,
    G: FeatureGate,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        deps: RunnerDeps<R, D, E, H, G>,
        clock: C,
        ids: I,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let zone = config.zone()?;
        Ok(Self {
            triggers: TriggerEngine::new(clock.clone(), zone),
            runner: ExecutionRunner::new(deps, clock, ids, config),
            listening: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start executing and schedule every active watch in the registry.
    ///
    /// Watches that cannot be scheduled are left out and returned.
    pub async fn start(&self) -> Result<Vec<TriggerError>, EngineError> {
        if !self.listening.swap(true, Ordering::SeqCst) {
            self.triggers.add_listener(Arc::new(self.runner.clone()));
        }
        self.runner.start();

        let watches = self.runner.registry().list().await?;
        let jobs: Vec<TriggerJob> = watches
            .into_iter()
            .filter(Watch::is_active)
            .map(|w| TriggerJob::new(w.id, w.trigger.schedule))
            .collect();
        let errors = self.triggers.start(jobs);
        for error in &errors {
            tracing::error!(error = %error, "watch not scheduled");
        }
        tracing::info!(scheduled = self.triggers.job_count(), "watch service started");
        Ok(errors)
    }

    /// Cancel every timer and wait for in-flight executions.
    ///
    /// Returns false when something had to be abandoned.
    pub async fn stop(&self) -> bool {
        let timeout = self.runner.config().stop_timeout;
        let timers_stopped = match self.triggers.stop(timeout).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "trigger engine did not stop cleanly");
                false
            }
        };
        let executions_finished = self.runner.stop().await;
        tracing::info!(executions_finished, "watch service stopped");
        timers_stopped && executions_finished
    }

    pub fn is_running(&self) -> bool {
        self.triggers.is_running() && self.runner.is_accepting()
    }

    /// Validate and store a watch, keeping the stored status of an existing
    /// watch with the same id, then (re)schedule it
    pub async fn put_watch(&self, mut watch: Watch) -> Result<WatchView, EngineError> {
        validate_watch(&watch).map_err(ParseError::from)?;

        let registry = self.runner.registry();
        if let Some(existing) = registry.load(&watch.id).await? {
            watch.status = existing.status;
        }
        watch.sync_status();
        registry.put(&watch).await?;
        tracing::info!(watch_id = %watch.id, "watch stored");

        self.reschedule(&watch)?;
        Ok(self.view(watch))
    }

    /// Parse a definition and store it
    pub async fn put_watch_source(
        &self,
        content: &str,
        format: Format,
        default_id: Option<&str>,
    ) -> Result<WatchView, EngineError> {
        let watch = parse_watch(content, format, default_id)?;
        self.put_watch(watch).await
    }

    pub async fn get_watch(&self, watch_id: &str) -> Result<Option<WatchView>, EngineError> {
        match self.runner.registry().load(watch_id).await? {
            Some(watch) => Ok(Some(self.view(watch))),
            None => Ok(None),
        }
    }

    pub async fn list_watches(&self) -> Result<Vec<Watch>, EngineError> {
        Ok(self.runner.registry().list().await?)
    }

    /// Unschedule and delete a watch. Returns whether it existed.
    pub async fn delete_watch(&self, watch_id: &str) -> Result<bool, EngineError> {
        self.triggers.remove(watch_id);
        let existed = self.runner.registry().delete(watch_id).await?;
        self.runner.forget(watch_id);
        if existed {
            tracing::info!(watch_id, "watch deleted");
        }
        Ok(existed)
    }

    /// Execute a watch now. A watch that stays busy past the manual wait is
    /// reported as [`EngineError::Busy`].
    pub async fn execute_watch(
        &self,
        watch_id: &str,
        request: ExecuteRequest,
    ) -> Result<ExecutionRecord, EngineError> {
        let record = self.runner.execute(watch_id, request).await?;
        if record.state == RecordState::AlreadyRunning {
            return Err(EngineError::Busy(watch_id.to_string()));
        }
        Ok(record)
    }

    pub async fn ack_watch(&self, watch_id: &str, action_ids: &[String]) -> Result<AckReport, EngineError> {
        self.runner.acknowledge(watch_id, action_ids).await
    }

    pub async fn activate_watch(&self, watch_id: &str) -> Result<WatchView, EngineError> {
        let (watch, changed) = self.runner.set_active(watch_id, true).await?;
        if changed {
            tracing::info!(watch_id, "watch activated");
        }
        self.reschedule(&watch)?;
        Ok(self.view(watch))
    }

    pub async fn deactivate_watch(&self, watch_id: &str) -> Result<WatchView, EngineError> {
        let (watch, changed) = self.runner.set_active(watch_id, false).await?;
        if changed {
            tracing::info!(watch_id, "watch deactivated");
        }
        self.reschedule(&watch)?;
        Ok(self.view(watch))
    }

    pub async fn stats(&self) -> Result<EngineStats, EngineError> {
        let watch_count = self.runner.registry().list().await?.len();
        let (pool_capacity, pool_in_use, rejected) = self.runner.pool_stats();
        Ok(EngineStats {
            running: self.is_running(),
            watch_count,
            scheduled_jobs: self.triggers.job_count(),
            pool_capacity,
            pool_in_use,
            rejected,
            queued: self.runner.queued(),
            current: self.runner.current_executions(),
        })
    }

    /// Active watches are scheduled while the service runs; everything else
    /// is unscheduled
    fn reschedule(&self, watch: &Watch) -> Result<(), EngineError> {
        if watch.is_active() && self.is_running() {
            let job = TriggerJob::new(watch.id.clone(), watch.trigger.schedule.clone());
            self.triggers.add(job)?;
        } else {
            self.triggers.remove(&watch.id);
        }
        Ok(())
    }

    fn view(&self, watch: Watch) -> WatchView {
        WatchView {
            scheduled: self.triggers.is_scheduled(&watch.id),
            next_fire: self.triggers.next_fire(&watch.id),
            last_record: self.runner.last_record(&watch.id),
            watch,
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

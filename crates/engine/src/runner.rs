// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution runner
//!
//! Turns a trigger event into one run of a watch: load the watch, claim
//! its in-flight slot, check the feature gate, run input, condition,
//! transform and actions, then persist the status and append a history
//! record. Everything that goes wrong after the watch is loaded ends up
//! in the record, never as an error to the caller.

use crate::config::EngineConfig;
use crate::dispatcher::ActionDispatcher;
use crate::error::EngineError;
use crate::guard::{InFlightGuard, WatchLease};
use crate::pool::WorkerPool;
use crate::stages::Stages;
use crate::stats::CurrentExecution;
use crate::trigger::TriggerListener;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use wx_adapters::{
    Channels, DataSource, FeatureGate, HistorySink, RegistryError, ScriptEngine, WatchRegistry,
};
use wx_core::{
    AckReport, Clock, ConditionResult, ExecuteRequest, ExecutionContext, ExecutionPhase,
    ExecutionRecord, ExecutionResult, IdGen, RecordState, Stage, StageFailure, TriggerEvent, Watch,
    WatchStatus,
};

/// Collaborators of the runner
pub struct RunnerDeps<R, D, E, H, G> {
    pub registry: R,
    pub source: D,
    pub scripts: E,
    pub history: H,
    pub gate: G,
    pub channels: Channels,
}

struct Inner<R, D, E, H, G, C, I> {
    registry: R,
    history: H,
    gate: G,
    clock: C,
    ids: I,
    stages: Stages<D, E>,
    dispatcher: ActionDispatcher<D, E, C>,
    guard: InFlightGuard,
    pool: WorkerPool,
    config: EngineConfig,
    accepting: AtomicBool,
    /// Bumped when stop gives up waiting; runs begun in an earlier epoch
    /// are not recorded, even after a restart
    epoch: AtomicU64,
    last_records: Mutex<HashMap<String, ExecutionRecord>>,
}

pub struct ExecutionRunner<R, D, E, H, G, C, I> {
    inner: Arc<Inner<R, D, E, H, G, C, I>>,
}

impl<R, D, E, H, G, C, I> Clone for ExecutionRunner<R, D, E, H, G, C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, D, E, H, G, C, I> ExecutionRunner<R, D, E, H, G, C, I>
where
    R: WatchRegistry,
    D: DataSource,
    E: ScriptEngine,
    H: HistorySink,
    G: FeatureGate,
    C: Clock,
    I: IdGen,
{
    pub fn new(deps: RunnerDeps<R, D, E, H, G>, clock: C, ids: I, config: EngineConfig) -> Self {
        let stages = Stages::new(deps.source, deps.scripts, config.input_timeout);
        let dispatcher = ActionDispatcher::new(
            stages.clone(),
            deps.channels,
            clock.clone(),
            config.default_throttle_period,
            config.action_timeout,
        );
        Self {
            inner: Arc::new(Inner {
                registry: deps.registry,
                history: deps.history,
                gate: deps.gate,
                clock,
                ids,
                stages,
                dispatcher,
                guard: InFlightGuard::new(),
                pool: WorkerPool::new(config.worker_pool_size),
                config,
                accepting: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                last_records: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn start(&self) {
        self.inner.accepting.store(true, Ordering::SeqCst);
    }

    /// Stop accepting work and wait, up to the stop timeout, for pooled
    /// executions. Returns false when executions were abandoned.
    pub async fn stop(&self) -> bool {
        self.inner.accepting.store(false, Ordering::SeqCst);
        let timeout = self.inner.config.stop_timeout;
        if self.inner.pool.drain(timeout).await {
            return true;
        }
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(
            ?timeout,
            in_flight = self.inner.pool.in_use(),
            "executions still running at stop; their results will not be recorded"
        );
        false
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    /// Run a trigger event to completion. Registry failures are logged.
    pub async fn execute_triggered(&self, event: TriggerEvent) -> Option<ExecutionRecord> {
        let watch_id = event.job_id.clone();
        match self.run(event, ExecuteRequest::default()).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(watch_id = %watch_id, error = %e, "execution failed to start");
                None
            }
        }
    }

    /// Execute a watch now, waiting briefly for an in-flight execution
    pub async fn execute(
        &self,
        watch_id: &str,
        request: ExecuteRequest,
    ) -> Result<ExecutionRecord, EngineError> {
        if !self.is_accepting() {
            return Err(EngineError::Stopped);
        }
        let event = TriggerEvent::manual(watch_id, self.inner.clock.now());
        self.run(event, request)
            .await?
            .ok_or_else(|| EngineError::WatchNotFound(watch_id.to_string()))
    }

    async fn run(
        &self,
        event: TriggerEvent,
        request: ExecuteRequest,
    ) -> Result<Option<ExecutionRecord>, EngineError> {
        let inner = &self.inner;
        let watch_id = event.job_id.clone();
        let epoch = inner.epoch.load(Ordering::SeqCst);

        if inner.registry.load(&watch_id).await?.is_none() {
            tracing::debug!(watch_id = %watch_id, "watch no longer exists; firing ignored");
            return Ok(None);
        }

        let lease = if event.is_manual() {
            inner.guard.acquire(&watch_id, inner.config.manual_wait).await
        } else {
            inner.guard.try_acquire(&watch_id)
        };
        let Some(lease) = lease else {
            let id = inner.ids.execution_id(&watch_id, inner.clock.now());
            let message = if event.is_manual() {
                format!(
                    "watch is still executing after waiting {:?}",
                    inner.config.manual_wait
                )
            } else {
                "watch is already executing; scheduled firing skipped".to_string()
            };
            tracing::info!(watch_id = %watch_id, manual = event.is_manual(), "{}", message);
            let record = ExecutionRecord::skipped(id, event, RecordState::AlreadyRunning, message);
            self.record(&record, None, request.record_execution, epoch).await;
            return Ok(Some(record));
        };

        // Reload under the lease: a previous run may have changed the status
        let Some(mut watch) = inner.registry.load(&watch_id).await? else {
            return Ok(None);
        };
        watch.sync_status();
        if !event.is_manual() && !watch.is_active() {
            tracing::debug!(watch_id = %watch_id, "watch is inactive; firing ignored");
            return Ok(None);
        }

        let now = inner.clock.now();
        let execution_id = inner.ids.execution_id(&watch_id, now);
        lease.begin(&execution_id, now);

        if !inner.gate.is_enabled() {
            let reason = inner.gate.denial_reason();
            tracing::info!(watch_id = %watch_id, execution_id = %execution_id, reason = %reason, "execution denied by feature gate");
            let record = ExecutionRecord::skipped(execution_id, event, RecordState::GateDenied, reason);
            self.record(&record, None, request.record_execution, epoch).await;
            return Ok(Some(record));
        }

        let mut status = watch.status.clone();
        let mut ctx = ExecutionContext::new(execution_id, watch, event, now).with_request(request);
        let result = self.pipeline(&mut ctx, &mut status, &lease).await;
        status.execution_state = Some(result.record_state());

        tracing::info!(
            watch_id = %watch_id,
            execution_id = %ctx.id,
            state = %result.record_state(),
            duration_ms = result.duration_ms,
            "watch executed"
        );
        let record = ExecutionRecord::completed(ctx.id.clone(), ctx.trigger.clone(), result, status.clone());
        self.record(&record, Some(&status), ctx.record_execution, epoch).await;
        lease.set_phase(ExecutionPhase::Finished);
        Ok(Some(record))
    }

    async fn pipeline(
        &self,
        ctx: &mut ExecutionContext,
        status: &mut WatchStatus,
        lease: &WatchLease,
    ) -> ExecutionResult {
        let inner = &self.inner;
        let started = Instant::now();
        let mut result = ExecutionResult::new(ctx.execution_time);

        let outcome = 'stages: {
            lease.set_phase(ExecutionPhase::Input);
            let input = match ctx.alternative_input.clone() {
                Some(payload) => Ok(Value::Object(payload)),
                None => {
                    let empty = Value::Object(Map::new());
                    inner.stages.input(&ctx.watch.input, ctx, &empty).await
                }
            };
            let payload = match input {
                Ok(payload) => payload,
                Err(e) => break 'stages Err(StageFailure { stage: Stage::Input, reason: e.to_string() }),
            };
            result.input = Some(payload.clone());
            ctx.payload = payload;

            lease.set_phase(ExecutionPhase::Condition);
            let condition = if ctx.ignore_condition {
                Ok(ConditionResult::met(true))
            } else {
                inner.stages.condition(&ctx.watch.condition, &ctx.model())
            };
            let condition = match condition {
                Ok(condition) => condition,
                Err(e) => {
                    break 'stages Err(StageFailure { stage: Stage::Condition, reason: e.to_string() })
                }
            };
            let met = condition.met;
            status.on_check(met, inner.clock.now());
            result.condition = Some(condition);
            if !met {
                break 'stages Ok(());
            }

            if let Some(transform) = &ctx.watch.transform {
                lease.set_phase(ExecutionPhase::WatchTransform);
                match inner.stages.transform(transform, ctx.payload.clone(), ctx).await {
                    Ok(payload) => {
                        result.transform = Some(payload.clone());
                        ctx.payload = payload;
                    }
                    Err(e) => {
                        break 'stages Err(StageFailure { stage: Stage::Transform, reason: e.to_string() })
                    }
                }
            }

            lease.set_phase(ExecutionPhase::Actions);
            result.actions = inner.dispatcher.dispatch(ctx, status).await;
            Ok(())
        };

        if let Err(failure) = outcome {
            tracing::warn!(
                watch_id = %ctx.watch.id,
                execution_id = %ctx.id,
                stage = %failure.stage,
                error = %failure.reason,
                "watch stage failed"
            );
            result.failure = Some(failure);
        }
        result.payload = ctx.payload.clone();
        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }

    /// Persist the status and append the record, unless the run asked not
    /// to be recorded or a stop since `epoch` abandoned it
    async fn record(
        &self,
        record: &ExecutionRecord,
        status: Option<&WatchStatus>,
        record_execution: bool,
        epoch: u64,
    ) {
        let inner = &self.inner;
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            tracing::warn!(watch_id = %record.watch_id, execution_id = %record.id, "abandoned execution not recorded");
            return;
        }
        if !record_execution {
            return;
        }

        if let Some(status) = status {
            match inner.registry.save_status(&record.watch_id, status).await {
                Ok(()) => {}
                Err(RegistryError::NotFound(_)) => {
                    tracing::debug!(watch_id = %record.watch_id, "watch deleted during execution; status dropped");
                }
                Err(e) => {
                    tracing::error!(watch_id = %record.watch_id, error = %e, "failed to save watch status");
                }
            }
        }
        if let Err(e) = inner.history.append(record).await {
            tracing::error!(watch_id = %record.watch_id, execution_id = %record.id, error = %e, "failed to append history");
        }
        inner
            .last_records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.watch_id.clone(), record.clone());
    }

    /// Record a firing the pool had no room for
    async fn reject(&self, event: TriggerEvent, epoch: u64) {
        let id = self.inner.ids.execution_id(&event.job_id, self.inner.clock.now());
        let message = format!(
            "worker pool is full ({} executions running)",
            self.inner.pool.capacity()
        );
        let record = ExecutionRecord::skipped(id, event, RecordState::Rejected, message);
        self.record(&record, None, true, epoch).await;
    }

    /// Change a watch's status while holding its in-flight slot.
    ///
    /// `apply` returns a value and whether the status changed; unchanged
    /// statuses are not written.
    async fn update_status<T>(
        &self,
        watch_id: &str,
        apply: impl FnOnce(&mut WatchStatus, DateTime<Utc>) -> (T, bool),
    ) -> Result<(Watch, T), EngineError> {
        let inner = &self.inner;
        let _lease = inner
            .guard
            .acquire(watch_id, inner.config.manual_wait)
            .await
            .ok_or_else(|| EngineError::Busy(watch_id.to_string()))?;

        let mut watch = inner
            .registry
            .load(watch_id)
            .await?
            .ok_or_else(|| EngineError::WatchNotFound(watch_id.to_string()))?;
        watch.sync_status();

        let (value, changed) = apply(&mut watch.status, inner.clock.now());
        if changed {
            inner.registry.save_status(watch_id, &watch.status).await?;
        }
        Ok((watch, value))
    }

    /// Acknowledge actions (every action when `action_ids` is empty)
    pub async fn acknowledge(&self, watch_id: &str, action_ids: &[String]) -> Result<AckReport, EngineError> {
        let (_, report) = self
            .update_status(watch_id, |status, now| {
                let report = status.acknowledge(action_ids, now);
                let changed = report.changed();
                (report, changed)
            })
            .await?;
        tracing::info!(watch_id = %watch_id, acked = ?report.acked, "actions acknowledged");
        Ok(report)
    }

    /// Returns the updated watch and whether its activation changed
    pub async fn set_active(&self, watch_id: &str, active: bool) -> Result<(Watch, bool), EngineError> {
        self.update_status(watch_id, |status, now| {
            let changed = status.set_active(active, now);
            (changed, changed)
        })
        .await
    }

    pub fn last_record(&self, watch_id: &str) -> Option<ExecutionRecord> {
        self.inner
            .last_records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(watch_id)
            .cloned()
    }

    pub fn current_executions(&self) -> Vec<CurrentExecution> {
        self.inner.guard.current()
    }

    /// Drop per-watch bookkeeping of a deleted watch
    pub fn forget(&self, watch_id: &str) {
        self.inner.guard.forget(watch_id);
        self.inner
            .last_records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(watch_id);
    }

    pub(crate) fn registry(&self) -> &R {
        &self.inner.registry
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub(crate) fn pool_stats(&self) -> (usize, usize, u64) {
        let pool = &self.inner.pool;
        (pool.capacity(), pool.in_use(), pool.rejected())
    }

    pub(crate) fn queued(&self) -> usize {
        self.inner.guard.queued()
    }
}

impl<R, D, E, H, G, C, I> TriggerListener for ExecutionRunner<R, D, E, H, G, C, I>
where
    R: WatchRegistry,
    D: DataSource,
    E: ScriptEngine,
    H: HistorySink,
    G: FeatureGate,
    C: Clock,
    I: IdGen,
{
    /// Hand a scheduled firing to the worker pool; a full pool rejects it.
    /// Manual firings run outside the pool.
    fn on_trigger(&self, event: &TriggerEvent) {
        if !self.is_accepting() {
            tracing::debug!(watch_id = %event.job_id, "runner stopped; firing dropped");
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::error!(watch_id = %event.job_id, "no async runtime; firing dropped");
            return;
        };

        let runner = self.clone();
        let event = event.clone();
        if event.is_manual() {
            handle.spawn(async move {
                runner.execute_triggered(event).await;
            });
            return;
        }
        match self.inner.pool.try_acquire() {
            Some(permit) => {
                handle.spawn(async move {
                    let _permit = permit;
                    runner.execute_triggered(event).await;
                });
            }
            None => {
                tracing::warn!(
                    watch_id = %event.job_id,
                    capacity = self.inner.pool.capacity(),
                    "worker pool saturated; firing rejected"
                );
                let epoch = self.inner.epoch.load(Ordering::SeqCst);
                handle.spawn(async move { runner.reject(event, epoch).await });
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

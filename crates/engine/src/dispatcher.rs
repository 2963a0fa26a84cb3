// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action dispatcher
//!
//! Runs every configured action of a watch, in declared order:
//! condition, throttle, transform, render, then either a simulated result
//! or a channel invocation. Errors are caught per action and recorded in
//! that action's result; they never stop the remaining actions.

use crate::render::render_action;
use crate::stages::Stages;
use std::time::{Duration, Instant};
use wx_adapters::{ChannelError, Channels, DataSource, RenderedAction, ScriptEngine};
use wx_core::{ActionEntry, ActionResult, ActionStatus, Clock, ExecutionContext, WatchStatus};

#[derive(Clone)]
pub struct ActionDispatcher<D, E, C> {
    stages: Stages<D, E>,
    channels: Channels,
    clock: C,
    default_throttle: Duration,
    action_timeout: Duration,
}

impl<D, E, C> ActionDispatcher<D, E, C>
where
    D: DataSource,
    E: ScriptEngine,
    C: Clock,
{
    pub fn new(
        stages: Stages<D, E>,
        channels: Channels,
        clock: C,
        default_throttle: Duration,
        action_timeout: Duration,
    ) -> Self {
        Self {
            stages,
            channels,
            clock,
            default_throttle,
            action_timeout,
        }
    }

    /// One result per action, in declared order. `status` is updated with
    /// every attempt and throttle of an action that is not simulated.
    pub async fn dispatch(&self, ctx: &ExecutionContext, status: &mut WatchStatus) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(ctx.watch.actions.len());
        for action in &ctx.watch.actions {
            let result = if ctx.simulate.includes(&action.id) {
                // Simulated actions read the status but never write it
                let mut scratch = status.action(&action.id).cloned().unwrap_or_default();
                self.run_action(ctx, action, &mut scratch).await
            } else {
                self.run_action(ctx, action, status.action_mut(&action.id)).await
            };
            tracing::debug!(
                watch_id = %ctx.watch.id,
                execution_id = %ctx.id,
                action_id = %action.id,
                outcome = %result.outcome,
                "action finished"
            );
            results.push(result);
        }
        results
    }

    async fn run_action(
        &self,
        ctx: &ExecutionContext,
        action: &ActionEntry,
        status: &mut ActionStatus,
    ) -> ActionResult {
        let id = action.id.as_str();
        let action_type = action.action_type();

        if let Some(condition) = &action.condition {
            match self.stages.condition(condition, &ctx.model()) {
                Ok(result) if !result.met => return ActionResult::condition_not_met(id, action_type),
                Ok(_) => {}
                Err(e) => return self.fail(status, action, format!("condition failed: {e}"), None),
            }
        }

        let now = self.clock.now();
        let period = ctx.watch.throttle_period_for(action, self.default_throttle);
        if let Some(reason) = status.throttle_reason(now, period) {
            status.on_throttle(now, reason.clone());
            return ActionResult::throttled(id, action_type, reason);
        }

        let payload = match &action.transform {
            Some(transform) => match self.stages.transform(transform, ctx.payload.clone(), ctx).await {
                Ok(payload) => payload,
                Err(e) => return self.fail(status, action, format!("transform failed: {e}"), None),
            },
            None => ctx.payload.clone(),
        };

        let rendered = match render_action(self.stages.scripts(), &action.kind, &payload, ctx) {
            Ok(rendered) => rendered,
            Err(e) => return self.fail(status, action, e.to_string(), None),
        };
        let request = rendered.summary();

        if ctx.simulate.includes(id) {
            return ActionResult::simulated(id, action_type, request);
        }

        match self.invoke(&ctx.watch.id, id, rendered).await {
            Ok(response) => {
                status.on_attempt(self.clock.now(), Ok(()));
                ActionResult::success(id, action_type, request, response)
            }
            Err(e) => self.fail(status, action, e.to_string(), Some(request)),
        }
    }

    fn fail(
        &self,
        status: &mut ActionStatus,
        action: &ActionEntry,
        reason: String,
        request: Option<serde_json::Value>,
    ) -> ActionResult {
        tracing::warn!(action_id = %action.id, error = %reason, "action failed");
        status.on_attempt(self.clock.now(), Err(reason.clone()));
        ActionResult::failure(&action.id, action.action_type(), reason, request)
    }

    /// Send on the channel registered for the action type.
    ///
    /// The send runs on its own task: a panic comes back as a failure and a
    /// send that outlives the action timeout is aborted.
    async fn invoke(
        &self,
        watch_id: &str,
        action_id: &str,
        rendered: RenderedAction,
    ) -> Result<serde_json::Value, ChannelError> {
        let action_type = rendered.action_type();
        let channel = self
            .channels
            .get(action_type)
            .ok_or_else(|| ChannelError::NotConfigured(action_type.to_string()))?;

        let start = Instant::now();
        let mut task = {
            let watch_id = watch_id.to_string();
            let action_id = action_id.to_string();
            tokio::spawn(async move { channel.send(&watch_id, &action_id, &rendered).await })
        };

        let outcome = match tokio::time::timeout(self.action_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ChannelError::Request(format!("channel panicked: {join}"))),
            Err(_) => {
                task.abort();
                Err(ChannelError::Timeout(self.action_timeout))
            }
        };
        tracing::debug!(
            action_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "channel invoked"
        );
        outcome
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

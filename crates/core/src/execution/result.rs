// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution results and history records

use crate::status::WatchStatus;
use crate::trigger::TriggerEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Success,
    Failure,
    Throttled,
    ConditionNotMet,
    Simulated,
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionOutcome::Success => "success",
            ActionOutcome::Failure => "failure",
            ActionOutcome::Throttled => "throttled",
            ActionOutcome::ConditionNotMet => "condition_not_met",
            ActionOutcome::Simulated => "simulated",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub outcome: ActionOutcome,
    /// Rendered request, with secrets masked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionResult {
    fn new(id: &str, action_type: &str, outcome: ActionOutcome) -> Self {
        Self {
            id: id.to_string(),
            action_type: action_type.to_string(),
            outcome,
            request: None,
            response: None,
            reason: None,
        }
    }

    pub fn success(id: &str, action_type: &str, request: Value, response: Value) -> Self {
        Self {
            request: Some(request),
            response: Some(response),
            ..Self::new(id, action_type, ActionOutcome::Success)
        }
    }

    pub fn failure(
        id: &str,
        action_type: &str,
        reason: impl Into<String>,
        request: Option<Value>,
    ) -> Self {
        Self {
            request,
            reason: Some(reason.into()),
            ..Self::new(id, action_type, ActionOutcome::Failure)
        }
    }

    pub fn throttled(id: &str, action_type: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(id, action_type, ActionOutcome::Throttled)
        }
    }

    pub fn condition_not_met(id: &str, action_type: &str) -> Self {
        Self::new(id, action_type, ActionOutcome::ConditionNotMet)
    }

    pub fn simulated(id: &str, action_type: &str, request: Value) -> Self {
        Self {
            request: Some(request),
            ..Self::new(id, action_type, ActionOutcome::Simulated)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub met: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ConditionResult {
    pub fn met(met: bool) -> Self {
        Self {
            met,
            data: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Condition,
    Transform,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Condition => write!(f, "condition"),
            Stage::Transform => write!(f, "transform"),
        }
    }
}

/// A watch-level stage error that aborted the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Full outcome of one run of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub execution_time: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Value>,
    pub payload: Value,
    /// One entry per configured action, in declaration order. Empty when the
    /// condition was not met or a stage failed.
    #[serde(default)]
    pub actions: Vec<ActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
}

impl ExecutionResult {
    pub fn new(execution_time: DateTime<Utc>) -> Self {
        Self {
            execution_time,
            duration_ms: 0,
            input: None,
            condition: None,
            transform: None,
            payload: Value::Object(Default::default()),
            actions: Vec::new(),
            failure: None,
        }
    }

    pub fn condition_met(&self) -> bool {
        self.condition.as_ref().is_some_and(|c| c.met)
    }

    pub fn action(&self, id: &str) -> Option<&ActionResult> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Summarize the run as a record state
    pub fn record_state(&self) -> RecordState {
        if self.failure.is_some() {
            RecordState::Failed
        } else if !self.condition_met() {
            RecordState::ExecutionNotNeeded
        } else if !self.actions.is_empty()
            && self
                .actions
                .iter()
                .all(|a| a.outcome == ActionOutcome::Throttled)
        {
            RecordState::Throttled
        } else {
            RecordState::Executed
        }
    }
}

/// Distinguishes "didn't run" from "ran" outcomes in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    ExecutionNotNeeded,
    Executed,
    Throttled,
    Failed,
    GateDenied,
    AlreadyRunning,
    Rejected,
}

impl RecordState {
    /// Whether the pipeline ran at all
    pub fn ran(&self) -> bool {
        matches!(
            self,
            RecordState::ExecutionNotNeeded
                | RecordState::Executed
                | RecordState::Throttled
                | RecordState::Failed
        )
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordState::ExecutionNotNeeded => "execution_not_needed",
            RecordState::Executed => "executed",
            RecordState::Throttled => "throttled",
            RecordState::Failed => "failed",
            RecordState::GateDenied => "gate_denied",
            RecordState::AlreadyRunning => "already_running",
            RecordState::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// One history entry, appended per execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub watch_id: String,
    pub trigger: TriggerEvent,
    pub state: RecordState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Watch status after the execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WatchStatus>,
}

impl ExecutionRecord {
    pub fn completed(
        id: impl Into<String>,
        trigger: TriggerEvent,
        result: ExecutionResult,
        status: WatchStatus,
    ) -> Self {
        let message = result
            .failure
            .as_ref()
            .map(|f| format!("{} failed: {}", f.stage, f.reason));
        Self {
            id: id.into(),
            watch_id: trigger.job_id.clone(),
            state: result.record_state(),
            trigger,
            result: Some(result),
            message,
            status: Some(status),
        }
    }

    /// Record for a firing that never reached the pipeline
    pub fn skipped(
        id: impl Into<String>,
        trigger: TriggerEvent,
        state: RecordState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            watch_id: trigger.job_id.clone(),
            trigger,
            state,
            result: None,
            message: Some(message.into()),
            status: None,
        }
    }
}

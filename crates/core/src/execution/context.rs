// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution context

use crate::trigger::TriggerEvent;
use crate::watch::Watch;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Which actions are dry-run instead of dispatched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulateSet {
    #[default]
    None,
    All,
    Only(BTreeSet<String>),
}

impl SimulateSet {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SimulateSet::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, action_id: &str) -> bool {
        match self {
            SimulateSet::None => false,
            SimulateSet::All => true,
            SimulateSet::Only(ids) => ids.contains(action_id),
        }
    }
}

/// Options for a manually requested execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub simulate: SimulateSet,
    /// Treat the watch condition as met
    #[serde(default)]
    pub ignore_condition: bool,
    /// Skip the input stage and start from this payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_input: Option<Map<String, Value>>,
    /// When false neither status nor history is written
    #[serde(default = "default_true")]
    pub record_execution: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExecuteRequest {
    fn default() -> Self {
        Self {
            simulate: SimulateSet::None,
            ignore_condition: false,
            alternative_input: None,
            record_execution: true,
        }
    }
}

impl ExecuteRequest {
    /// Dry-run every action without recording anything
    pub fn simulate_all() -> Self {
        Self {
            simulate: SimulateSet::All,
            record_execution: false,
            ..Self::default()
        }
    }
}

/// Where an execution currently is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    AwaitsExecution,
    Started,
    Input,
    Condition,
    WatchTransform,
    Actions,
    Finished,
}

/// Everything a single firing needs. Holds a snapshot of the watch, never
/// the registry's copy.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub id: String,
    pub watch: Watch,
    pub trigger: TriggerEvent,
    pub execution_time: DateTime<Utc>,
    pub payload: Value,
    pub simulate: SimulateSet,
    pub ignore_condition: bool,
    pub alternative_input: Option<Map<String, Value>>,
    pub record_execution: bool,
}

impl ExecutionContext {
    pub fn new(
        id: impl Into<String>,
        watch: Watch,
        trigger: TriggerEvent,
        execution_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            watch,
            trigger,
            execution_time,
            payload: Value::Object(Map::new()),
            simulate: SimulateSet::None,
            ignore_condition: false,
            alternative_input: None,
            record_execution: true,
        }
    }

    pub fn with_request(mut self, request: ExecuteRequest) -> Self {
        self.simulate = request.simulate;
        self.ignore_condition = request.ignore_condition;
        self.alternative_input = request.alternative_input;
        self.record_execution = request.record_execution;
        self
    }

    pub fn watch_id(&self) -> &str {
        &self.watch.id
    }

    /// Template/script model over the current payload
    pub fn model(&self) -> Value {
        self.model_with_payload(&self.payload)
    }

    /// Template/script model:
    /// `{"ctx": {watch_id, execution_id, execution_time, trigger, metadata, payload}}`
    pub fn model_with_payload(&self, payload: &Value) -> Value {
        json!({
            "ctx": {
                "watch_id": self.watch.id,
                "execution_id": self.id,
                "execution_time": rfc3339(self.execution_time),
                "trigger": {
                    "scheduled_time": rfc3339(self.trigger.scheduled_time),
                    "triggered_time": rfc3339(self.trigger.triggered_time),
                },
                "metadata": self.watch.metadata,
                "payload": payload,
            }
        })
    }
}

pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolve a dotted path such as `ctx.payload.hits.0.count`.
/// Numeric segments index into arrays.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Wrap non-object values so the payload is always a document
pub fn as_payload(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        other => json!({ "_value": other }),
    }
}

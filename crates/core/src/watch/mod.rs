// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch definitions
//!
//! A watch is a trigger, an input, a condition, an optional transform and an
//! ordered list of actions. Stage and action kinds are closed sets of tagged
//! variants keyed by their `type` string.

mod action;
mod stages;

pub use action::{ActionDef, BasicAuth, HttpMethod, HttpRequest, HttpRequestTemplate, LogLevel, Scheme};
pub use stages::{CompareOp, ConditionDef, InputDef, NamedInput, TransformDef};

use crate::schedule::Schedule;
use crate::status::WatchStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub schedule: Schedule,
}

/// A watch definition plus its current status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub id: String,
    pub trigger: TriggerDef,
    #[serde(default)]
    pub input: InputDef,
    #[serde(default)]
    pub condition: ConditionDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDef>,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
    /// Watch-level throttle, used by actions that don't set their own
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub throttle_period: Option<Duration>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub status: WatchStatus,
}

impl Watch {
    pub fn action(&self, id: &str) -> Option<&ActionEntry> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.id.as_str())
    }

    /// Align the status action map with the configured actions
    pub fn sync_status(&mut self) {
        let ids: Vec<String> = self.action_ids().map(String::from).collect();
        self.status.sync_actions(ids.iter().map(String::as_str));
    }

    pub fn is_active(&self) -> bool {
        self.status.state.active
    }

    /// Whether two watches share the same definition, ignoring status
    pub fn same_definition(&self, other: &Watch) -> bool {
        let mut lhs = self.clone();
        lhs.status = other.status.clone();
        lhs == *other
    }

    /// Resolve an action's throttle period.
    ///
    /// Precedence is action, then watch, then `default`. An explicit zero at
    /// any level disables throttling and stops the fallback.
    pub fn throttle_period_for(&self, action: &ActionEntry, default: Duration) -> Option<Duration> {
        let period = action
            .throttle_period
            .or(self.throttle_period)
            .unwrap_or(default);
        (!period.is_zero()).then_some(period)
    }
}

/// A configured action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub id: String,
    #[serde(flatten)]
    pub kind: ActionDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDef>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub throttle_period: Option<Duration>,
}

impl ActionEntry {
    pub fn action_type(&self) -> &'static str {
        self.kind.action_type()
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;

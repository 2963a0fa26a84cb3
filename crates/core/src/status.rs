// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch status and the per-action ack state machine
//!
//! Status is owned by whoever holds the watch's in-flight guard. It is read as
//! a snapshot when an execution starts and written back once at the end.

use crate::execution::RecordState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Acknowledgement state of a single action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckState {
    #[default]
    AwaitsSuccessfulExecution,
    Ackable,
    Acked,
}

impl std::fmt::Display for AckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AckState::AwaitsSuccessfulExecution => "awaits_successful_execution",
            AckState::Ackable => "ackable",
            AckState::Acked => "acked",
        };
        write!(f, "{}", s)
    }
}

/// Events that drive the ack state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckEvent {
    /// The action ran successfully while the watch condition was met
    ExecutedSuccessfully,
    /// An operator acknowledged the action
    Acknowledge,
    /// The watch condition was evaluated as not met
    ConditionNotMet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckStatus {
    pub state: AckState,
    /// When the state last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AckStatus {
    /// Pure state transition. Events that don't apply leave the status as is.
    pub fn transition(&self, event: AckEvent, now: DateTime<Utc>) -> Self {
        let next = match (self.state, event) {
            (AckState::AwaitsSuccessfulExecution, AckEvent::ExecutedSuccessfully) => {
                AckState::Ackable
            }
            (AckState::Ackable, AckEvent::Acknowledge) => AckState::Acked,
            (AckState::Ackable | AckState::Acked, AckEvent::ConditionNotMet) => {
                AckState::AwaitsSuccessfulExecution
            }
            (state, _) => state,
        };

        if next == self.state {
            self.clone()
        } else {
            AckStatus {
                state: next,
                timestamp: Some(now),
            }
        }
    }
}

/// Outcome of the last attempt to run an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub timestamp: DateTime<Utc>,
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Durable state of one action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    #[serde(default)]
    pub ack: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<Execution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_execution: Option<Execution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_throttle: Option<Throttle>,
}

impl ActionStatus {
    /// Record an attempt to invoke the action's channel
    pub fn on_attempt(&mut self, now: DateTime<Utc>, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                let execution = Execution {
                    timestamp: now,
                    successful: true,
                    reason: None,
                };
                self.last_execution = Some(execution.clone());
                self.last_successful_execution = Some(execution);
                self.ack = self.ack.transition(AckEvent::ExecutedSuccessfully, now);
            }
            Err(reason) => {
                self.last_execution = Some(Execution {
                    timestamp: now,
                    successful: false,
                    reason: Some(reason),
                });
            }
        }
    }

    pub fn on_throttle(&mut self, now: DateTime<Utc>, reason: impl Into<String>) {
        self.last_throttle = Some(Throttle {
            timestamp: now,
            reason: reason.into(),
        });
    }

    pub fn is_acked(&self) -> bool {
        self.ack.state == AckState::Acked
    }

    /// Why the action may not run at `now`, if it is throttled.
    ///
    /// An acked action is always throttled. Otherwise the period counts from
    /// the last successful execution, so failed attempts are retried on the
    /// next firing.
    pub fn throttle_reason(&self, now: DateTime<Utc>, period: Option<Duration>) -> Option<String> {
        if self.is_acked() {
            return Some(match self.ack.timestamp {
                Some(at) => format!("action has been acknowledged at [{}]", at.to_rfc3339()),
                None => "action has been acknowledged".to_string(),
            });
        }

        let period = period?;
        let last = self.last_successful_execution.as_ref()?.timestamp;
        let elapsed = (now - last).to_std().unwrap_or_default();
        (elapsed < period).then(|| {
            format!(
                "throttling interval is set to [{}] but time elapsed since last execution is [{}]",
                humantime::format_duration(period),
                humantime::format_duration(truncate_millis(elapsed))
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationState {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for ActivationState {
    fn default() -> Self {
        Self {
            active: true,
            timestamp: None,
        }
    }
}

/// Result of an acknowledge request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckReport {
    /// Actions moved from ackable to acked
    pub acked: Vec<String>,
    /// Actions left untouched because they were not ackable
    pub not_ackable: Vec<(String, AckState)>,
    /// Requested ids the watch has no action for
    pub unknown: Vec<String>,
}

impl AckReport {
    pub fn changed(&self) -> bool {
        !self.acked.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchStatus {
    #[serde(default)]
    pub state: ActivationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_met_condition: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionStatus>,
    /// State of the most recent recorded execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_state: Option<RecordState>,
}

impl WatchStatus {
    pub fn new<'a>(action_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut status = Self::default();
        status.sync_actions(action_ids);
        status
    }

    /// Align the action map with a (possibly redefined) watch: keep the
    /// state of surviving actions, add new ones, drop removed ones.
    pub fn sync_actions<'a>(&mut self, action_ids: impl IntoIterator<Item = &'a str>) {
        let mut actions = BTreeMap::new();
        for id in action_ids {
            let status = self.actions.remove(id).unwrap_or_default();
            actions.insert(id.to_string(), status);
        }
        self.actions = actions;
    }

    /// Record a condition check. `last_checked` never moves backwards.
    pub fn on_check(&mut self, met: bool, now: DateTime<Utc>) {
        self.last_checked = Some(self.last_checked.map_or(now, |prev| prev.max(now)));
        if met {
            self.last_met_condition = Some(self.last_met_condition.map_or(now, |prev| prev.max(now)));
        } else {
            for action in self.actions.values_mut() {
                action.ack = action.ack.transition(AckEvent::ConditionNotMet, now);
            }
        }
    }

    /// Acknowledge the given actions, or every action when `action_ids` is empty
    pub fn acknowledge(&mut self, action_ids: &[String], now: DateTime<Utc>) -> AckReport {
        let targets: Vec<String> = if action_ids.is_empty() {
            self.actions.keys().cloned().collect()
        } else {
            action_ids.to_vec()
        };

        let mut report = AckReport::default();
        for id in targets {
            match self.actions.get_mut(&id) {
                None => report.unknown.push(id),
                Some(action) if action.ack.state == AckState::Ackable => {
                    action.ack = action.ack.transition(AckEvent::Acknowledge, now);
                    report.acked.push(id);
                }
                Some(action) => report.not_ackable.push((id, action.ack.state)),
            }
        }
        report
    }

    /// Toggle activation. Returns whether the state changed.
    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) -> bool {
        if self.state.active == active {
            return false;
        }
        self.state = ActivationState {
            active,
            timestamp: Some(now),
        };
        true
    }

    pub fn action(&self, id: &str) -> Option<&ActionStatus> {
        self.actions.get(id)
    }

    pub fn action_mut(&mut self, id: &str) -> &mut ActionStatus {
        self.actions.entry(id.to_string()).or_default()
    }
}

fn truncate_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

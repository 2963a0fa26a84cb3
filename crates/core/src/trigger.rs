// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fired by the job's own schedule
    Scheduled,
    /// Fired on request (execute-now or simulation)
    Manual,
}

/// One firing of a job. Delivered once to every listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub job_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub triggered_time: DateTime<Utc>,
    pub kind: TriggerKind,
}

impl TriggerEvent {
    pub fn scheduled(
        job_id: impl Into<String>,
        scheduled_time: DateTime<Utc>,
        triggered_time: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            scheduled_time,
            triggered_time,
            kind: TriggerKind::Scheduled,
        }
    }

    pub fn manual(job_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            scheduled_time: now,
            triggered_time: now,
            kind: TriggerKind::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.kind == TriggerKind::Manual
    }
}

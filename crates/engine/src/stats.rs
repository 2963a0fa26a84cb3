// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only snapshots for the control surface

use chrono::{DateTime, Utc};
use serde::Serialize;
use wx_core::{ExecutionPhase, ExecutionRecord, Watch};

/// An execution that holds its watch's in-flight slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentExecution {
    pub watch_id: String,
    pub execution_id: String,
    pub started: DateTime<Utc>,
    pub phase: ExecutionPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub running: bool,
    pub watch_count: usize,
    pub scheduled_jobs: usize,
    pub pool_capacity: usize,
    pub pool_in_use: usize,
    /// Scheduled firings dropped because the pool was full
    pub rejected: u64,
    /// Manual requests waiting for an in-flight execution of the same watch
    pub queued: usize,
    /// Oldest first
    pub current: Vec<CurrentExecution>,
}

/// A watch with its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchView {
    pub watch: Watch,
    pub scheduled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_fire: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_record: Option<ExecutionRecord>,
}

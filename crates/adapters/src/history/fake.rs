// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake history sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{HistoryError, HistorySink};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use wx_core::{ExecutionRecord, RecordState};

#[derive(Default)]
struct FakeState {
    records: Vec<ExecutionRecord>,
    fail_writes: Option<String>,
}

/// Recording history sink with scripted write failures
#[derive(Clone, Default)]
pub struct FakeHistory {
    state: Arc<Mutex<FakeState>>,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every append until cleared
    pub fn fail_writes(&self, reason: &str) {
        self.lock().fail_writes = Some(reason.to_string());
    }

    pub fn clear_failure(&self) {
        self.lock().fail_writes = None;
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.lock().records.clone()
    }

    pub fn states(&self) -> Vec<RecordState> {
        self.lock().records.iter().map(|r| r.state).collect()
    }

    pub fn last(&self) -> Option<ExecutionRecord> {
        self.lock().records.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HistorySink for FakeHistory {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), HistoryError> {
        let mut state = self.lock();
        if let Some(reason) = &state.fail_writes {
            return Err(HistoryError::Write(reason.clone()));
        }
        state.records.push(record.clone());
        Ok(())
    }
}

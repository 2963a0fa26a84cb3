// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution history sinks

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHistory;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use wx_core::ExecutionRecord;

/// Errors from history operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history write failed: {0}")]
    Write(String),
}

/// Append-only destination for execution records
#[async_trait]
pub trait HistorySink: Clone + Send + Sync + 'static {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), HistoryError>;
}

/// In-memory history, newest last
///
/// With a capacity, the oldest records are dropped once it is exceeded.
#[derive(Clone, Default)]
pub struct MemoryHistory {
    records: Arc<Mutex<VecDeque<ExecutionRecord>>>,
    capacity: Option<usize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Records for one watch, newest first
    pub fn for_watch(&self, watch_id: &str, limit: usize) -> Vec<ExecutionRecord> {
        self.lock()
            .iter()
            .rev()
            .filter(|r| r.watch_id == watch_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ExecutionRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HistorySink for MemoryHistory {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), HistoryError> {
        let mut records = self.lock();
        records.push_back(record.clone());
        if let Some(capacity) = self.capacity {
            while records.len() > capacity {
                records.pop_front();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;

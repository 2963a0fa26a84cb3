// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake data source for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DataSource, Query, SourceError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct FakeState {
    queries: Vec<Query>,
    responses: VecDeque<Result<Value, SourceError>>,
    fallback: Option<Result<Value, SourceError>>,
    delay: Option<Duration>,
}

/// Fake data source: records queries and replays scripted responses
#[derive(Clone, Default)]
pub struct FakeDataSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every query with `value` once queued responses run out
    pub fn always(self, value: Value) -> Self {
        self.lock().fallback = Some(Ok(value));
        self
    }

    /// Fail every query once queued responses run out
    pub fn always_fail(self, error: SourceError) -> Self {
        self.lock().fallback = Some(Err(error));
        self
    }

    /// Queue a one-shot response
    pub fn push_response(&self, response: Result<Value, SourceError>) {
        self.lock().responses.push_back(response);
    }

    /// Sleep (on the tokio clock) before answering
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// All queries received so far
    pub fn queries(&self) -> Vec<Query> {
        self.lock().queries.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DataSource for FakeDataSource {
    async fn query(&self, query: &Query, _timeout: Duration) -> Result<Value, SourceError> {
        let (response, delay) = {
            let mut state = self.lock();
            state.queries.push(query.clone());
            let response = state
                .responses
                .pop_front()
                .or_else(|| state.fallback.clone())
                .unwrap_or_else(|| Ok(Value::Object(Default::default())));
            (response, state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

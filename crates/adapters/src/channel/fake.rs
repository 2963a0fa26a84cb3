// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification channel for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChannelError, NotifyChannel, RenderedAction};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded channel call
#[derive(Debug, Clone)]
pub struct ChannelCall {
    pub watch_id: String,
    pub action_id: String,
    pub action: RenderedAction,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ChannelCall>,
    failures: HashMap<String, ChannelError>,
    fail_all: Option<ChannelError>,
    panics: HashSet<String>,
    delay: Option<Duration>,
}

/// Call-counting fake channel with scripted failures
#[derive(Clone, Default)]
pub struct FakeChannel {
    state: Arc<Mutex<FakeState>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail sends for one action id
    pub fn fail_action(&self, action_id: &str, error: ChannelError) {
        self.lock().failures.insert(action_id.to_string(), error);
    }

    /// Fail every send
    pub fn fail_all(&self, error: ChannelError) {
        self.lock().fail_all = Some(error);
    }

    /// Panic while sending for one action id
    pub fn panic_on(&self, action_id: &str) {
        self.lock().panics.insert(action_id.to_string());
    }

    /// Sleep (on the tokio clock) before answering
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl NotifyChannel for FakeChannel {
    #[allow(clippy::panic)]
    async fn send(
        &self,
        watch_id: &str,
        action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        let (outcome, should_panic, delay) = {
            let mut state = self.lock();
            state.calls.push(ChannelCall {
                watch_id: watch_id.to_string(),
                action_id: action_id.to_string(),
                action: action.clone(),
            });
            let outcome = match state.failures.get(action_id).or(state.fail_all.as_ref()) {
                Some(error) => Err(error.clone()),
                None => Ok(json!({ "sent": action_id })),
            };
            (outcome, state.panics.contains(action_id), state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if should_panic {
            panic!("fake channel panic for action {}", action_id);
        }
        outcome
    }
}

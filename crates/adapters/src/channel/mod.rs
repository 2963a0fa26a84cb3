// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification channels: one implementation per action type

mod logging;
mod noop;
mod webhook;

pub use logging::LoggingChannel;
pub use noop::NoOpChannel;
pub use webhook::WebhookChannel;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ChannelCall, FakeChannel};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wx_core::watch::LogLevel;
use wx_core::HttpRequest;

/// Errors from channel invocations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel not configured for action type '{0}'")]
    NotConfigured(String),
    #[error("channel timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Request(String),
    #[error("received status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("channel rejected action: {0}")]
    Rejected(String),
}

/// An action with every template rendered, ready to send
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedAction {
    Logging {
        level: LogLevel,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        text: String,
    },
    Webhook {
        request: HttpRequest,
    },
    Index {
        index: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc_id: Option<String>,
        document: Value,
    },
}

impl RenderedAction {
    pub fn action_type(&self) -> &'static str {
        match self {
            RenderedAction::Logging { .. } => "logging",
            RenderedAction::Webhook { .. } => "webhook",
            RenderedAction::Index { .. } => "index",
        }
    }

    /// JSON form safe to keep in history: credentials are masked
    pub fn summary(&self) -> Value {
        let summary = match self {
            RenderedAction::Webhook { request } => serde_json::to_value(RenderedAction::Webhook {
                request: request.redacted(),
            }),
            other => serde_json::to_value(other),
        };
        summary.unwrap_or(Value::Null)
    }
}

/// Delivers a rendered action. The dispatcher never retries.
#[async_trait]
pub trait NotifyChannel: Send + Sync + 'static {
    async fn send(
        &self,
        watch_id: &str,
        action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError>;
}

/// Channels keyed by action type
#[derive(Clone, Default)]
pub struct Channels {
    by_type: HashMap<String, Arc<dyn NotifyChannel>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action_type: &str, channel: impl NotifyChannel) -> Self {
        self.register(action_type, channel);
        self
    }

    pub fn register(&mut self, action_type: &str, channel: impl NotifyChannel) {
        self.by_type
            .insert(action_type.to_string(), Arc::new(channel));
    }

    pub fn get(&self, action_type: &str) -> Option<Arc<dyn NotifyChannel>> {
        self.by_type.get(action_type).cloned()
    }

    /// Registered action types, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;

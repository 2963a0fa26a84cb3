// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging channel: writes the rendered text to the tracing log

use super::{ChannelError, NotifyChannel, RenderedAction};
use async_trait::async_trait;
use serde_json::{json, Value};
use wx_core::watch::LogLevel;

#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingChannel;

impl LoggingChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyChannel for LoggingChannel {
    async fn send(
        &self,
        watch_id: &str,
        action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        let RenderedAction::Logging {
            level,
            category,
            text,
        } = action
        else {
            return Err(ChannelError::Rejected(format!(
                "logging channel cannot send {} actions",
                action.action_type()
            )));
        };

        let category = category.as_deref().unwrap_or("");
        match level {
            LogLevel::Error => {
                tracing::error!(target: "wx::action", watch_id, action_id, category, "{}", text)
            }
            LogLevel::Warn => {
                tracing::warn!(target: "wx::action", watch_id, action_id, category, "{}", text)
            }
            LogLevel::Info => {
                tracing::info!(target: "wx::action", watch_id, action_id, category, "{}", text)
            }
            LogLevel::Debug => {
                tracing::debug!(target: "wx::action", watch_id, action_id, category, "{}", text)
            }
            LogLevel::Trace => {
                tracing::trace!(target: "wx::action", watch_id, action_id, category, "{}", text)
            }
        }

        Ok(json!({ "logged_text": text }))
    }
}

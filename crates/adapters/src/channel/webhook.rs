// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook channel: sends the rendered HTTP request

use super::{ChannelError, NotifyChannel, RenderedAction};
use crate::http;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use ureq::Agent;

#[derive(Clone)]
pub struct WebhookChannel {
    agent: Agent,
}

impl WebhookChannel {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
        }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    async fn send(
        &self,
        _watch_id: &str,
        _action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        let RenderedAction::Webhook { request } = action else {
            return Err(ChannelError::Rejected(format!(
                "webhook channel cannot send {} actions",
                action.action_type()
            )));
        };

        let agent = self.agent.clone();
        let request = request.clone();
        let response = tokio::task::spawn_blocking(move || http::execute(&agent, &request, None))
            .await
            .map_err(|e| ChannelError::Request(e.to_string()))?
            .map_err(|e| ChannelError::Request(e.to_string()))?;

        if !response.is_success() {
            return Err(ChannelError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(json!({ "status": response.status, "body": response.body }))
    }
}

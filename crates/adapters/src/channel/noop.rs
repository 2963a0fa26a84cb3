// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op channel

use super::{ChannelError, NotifyChannel, RenderedAction};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Channel that accepts every action and does nothing.
///
/// Used for action types that are disabled in a deployment.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpChannel;

impl NoOpChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyChannel for NoOpChannel {
    async fn send(
        &self,
        _watch_id: &str,
        _action_id: &str,
        _action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        Ok(Value::Object(Map::new()))
    }
}

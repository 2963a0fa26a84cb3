// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::channel::{ChannelError, NotifyChannel, RenderedAction};
use crate::source::{DataSource, Query, SourceError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any NotifyChannel
#[derive(Clone)]
pub struct TracedChannel<C> {
    inner: C,
}

impl<C> TracedChannel<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: NotifyChannel> NotifyChannel for TracedChannel<C> {
    async fn send(
        &self,
        watch_id: &str,
        action_id: &str,
        action: &RenderedAction,
    ) -> Result<Value, ChannelError> {
        let span = tracing::info_span!(
            "channel.send",
            watch_id,
            action_id,
            action_type = action.action_type()
        );

        async {
            tracing::debug!("sending");
            let start = Instant::now();
            let result = self.inner.send(watch_id, action_id, action).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "sent"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "send failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any DataSource
#[derive(Clone)]
pub struct TracedDataSource<D> {
    inner: D,
}

impl<D> TracedDataSource<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: DataSource> DataSource for TracedDataSource<D> {
    async fn query(&self, query: &Query, timeout: Duration) -> Result<Value, SourceError> {
        let span = tracing::info_span!("source.query", kind = query.kind());

        async {
            if let Query::Http { request } = query {
                tracing::debug!(method = %request.method, url = %request.url(), "querying");
            }
            let start = Instant::now();
            let result = self.inner.query(query, timeout).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "query complete"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "query failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op data source for deployments without external data

use super::{DataSource, Query, SourceError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

/// Data source that answers every query with an empty document
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpDataSource;

impl NoOpDataSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataSource for NoOpDataSource {
    async fn query(&self, _query: &Query, _timeout: Duration) -> Result<Value, SourceError> {
        Ok(Value::Object(Map::new()))
    }
}

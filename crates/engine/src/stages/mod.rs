// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input, condition and transform evaluation
//!
//! Inputs and transforms may nest (chains of chains), so their evaluators
//! return boxed futures.

mod condition;
mod input;
mod transform;

use crate::render::RenderError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use wx_adapters::{DataSource, Query, ScriptEngine, ScriptError, SourceError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Invalid(String),
}

pub(crate) type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, StageError>> + Send + 'a>>;

/// Evaluates watch- and action-level stages against a data source and a
/// script engine
#[derive(Clone)]
pub struct Stages<D, E> {
    source: D,
    scripts: E,
    input_timeout: Duration,
}

impl<D: DataSource, E: ScriptEngine> Stages<D, E> {
    pub fn new(source: D, scripts: E, input_timeout: Duration) -> Self {
        Self {
            source,
            scripts,
            input_timeout,
        }
    }

    pub fn scripts(&self) -> &E {
        &self.scripts
    }

    /// Run a query, bounded by `timeout` or the default input timeout
    async fn query(&self, query: Query, timeout: Option<Duration>) -> Result<Value, StageError> {
        let timeout = timeout.unwrap_or(self.input_timeout);
        match tokio::time::timeout(timeout, self.source.query(&query, timeout)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(StageError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
#[path = "stages_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External data sources queried by inputs and transforms

mod http;
mod noop;

pub use http::HttpDataSource;
pub use noop::NoOpDataSource;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDataSource;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use wx_core::HttpRequest;

/// Errors from data source queries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0} queries are not supported by this data source")]
    Unsupported(&'static str),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// A query description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    Search { indices: Vec<String>, body: Value },
    Http { request: HttpRequest },
}

impl Query {
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Search { .. } => "search",
            Query::Http { .. } => "http",
        }
    }
}

/// Executes queries and returns a structured document
#[async_trait]
pub trait DataSource: Clone + Send + Sync + 'static {
    async fn query(&self, query: &Query, timeout: Duration) -> Result<Value, SourceError>;
}

/// Sends search queries to one source and HTTP queries to another
#[derive(Clone)]
pub struct RoutedDataSource<S, H> {
    search: S,
    http: H,
}

impl<S, H> RoutedDataSource<S, H> {
    pub fn new(search: S, http: H) -> Self {
        Self { search, http }
    }
}

#[async_trait]
impl<S: DataSource, H: DataSource> DataSource for RoutedDataSource<S, H> {
    async fn query(&self, query: &Query, timeout: Duration) -> Result<Value, SourceError> {
        match query {
            Query::Search { .. } => self.search.query(query, timeout).await,
            Query::Http { .. } => self.http.query(query, timeout).await,
        }
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;

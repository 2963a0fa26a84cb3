// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-backed data source

use super::{DataSource, Query, SourceError};
use crate::http::{self, HttpResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use ureq::Agent;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs HTTP inputs, and search queries against an optional search endpoint
/// (`POST {base}/{indices}/_search`).
#[derive(Clone)]
pub struct HttpDataSource {
    agent: Agent,
    search_base: Option<String>,
}

impl Default for HttpDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDataSource {
    pub fn new() -> Self {
        Self {
            agent: http::agent(DEFAULT_TIMEOUT),
            search_base: None,
        }
    }

    pub fn with_search_endpoint(mut self, base: impl Into<String>) -> Self {
        self.search_base = Some(base.into());
        self
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn query(&self, query: &Query, timeout: Duration) -> Result<Value, SourceError> {
        let agent = self.agent.clone();
        match query {
            Query::Http { request } => {
                let request = request.clone();
                let response = tokio::task::spawn_blocking(move || {
                    http::execute(&agent, &request, Some(timeout))
                })
                .await
                .map_err(|e| SourceError::Request(e.to_string()))?
                .map_err(|e| SourceError::Request(e.to_string()))?;
                Ok(http_payload(response))
            }
            Query::Search { indices, body } => {
                let base = self
                    .search_base
                    .as_deref()
                    .ok_or(SourceError::Unsupported("search"))?;
                let url = format!("{}/{}/_search", base.trim_end_matches('/'), indices.join(","));
                let body = body.to_string();
                let response = tokio::task::spawn_blocking(move || {
                    search(&agent, &url, &body, timeout)
                })
                .await
                .map_err(|e| SourceError::Request(e.to_string()))?
                .map_err(|e| SourceError::Request(e.to_string()))?;

                if !response.is_success() {
                    return Err(SourceError::Request(format!(
                        "search returned {}: {}",
                        response.status, response.body
                    )));
                }
                serde_json::from_str(&response.body).map_err(|e| SourceError::Decode(e.to_string()))
            }
        }
    }
}

fn search(agent: &Agent, url: &str, body: &str, timeout: Duration) -> Result<HttpResponse, ureq::Error> {
    let mut response = agent
        .post(url)
        .header("Content-Type", "application/json")
        .config()
        .timeout_global(Some(timeout))
        .build()
        .send(body)?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse { status, body })
}

/// JSON object bodies are used as is; anything else is wrapped in `_value`.
/// The status code is always included as `_status`.
pub(crate) fn http_payload(response: HttpResponse) -> Value {
    let mut payload = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "_value": other }),
        Err(_) => json!({ "_value": response.body }),
    };
    if let Some(map) = payload.as_object_mut() {
        map.insert("_status".to_string(), json!(response.status));
    }
    payload
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking HTTP execution shared by the webhook channel and HTTP input

use base64::Engine;
use serde::Serialize;
use std::time::Duration;
use ureq::{Agent, RequestBuilder};
use wx_core::watch::BasicAuth;
use wx_core::{HttpMethod, HttpRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Agent that reports non-2xx statuses as responses, not errors
pub(crate) fn agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build();
    Agent::new_with_config(config)
}

/// Run a request to completion. Blocks; call from `spawn_blocking`.
pub(crate) fn execute(
    agent: &Agent,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> Result<HttpResponse, ureq::Error> {
    let url = request.url();
    let response = match request.method {
        HttpMethod::Get => decorate(agent.get(&url), request, timeout).call(),
        HttpMethod::Delete => decorate(agent.delete(&url), request, timeout).call(),
        HttpMethod::Head => decorate(agent.head(&url), request, timeout).call(),
        HttpMethod::Post => {
            let builder = decorate(agent.post(&url), request, timeout);
            match &request.body {
                Some(body) => builder.send(body.as_str()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = decorate(agent.put(&url), request, timeout);
            match &request.body {
                Some(body) => builder.send(body.as_str()),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = response?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse { status, body })
}

fn decorate<B>(
    mut builder: RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in &request.params {
        builder = builder.query(name, value);
    }
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    if let Some(auth) = &request.auth {
        builder = builder.header("Authorization", basic_auth(auth));
    }
    if let Some(timeout) = timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

pub(crate) fn basic_auth(auth: &BasicAuth) -> String {
    let credentials = format!("{}:{}", auth.username, auth.password);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

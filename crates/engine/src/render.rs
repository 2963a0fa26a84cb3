// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering action and request templates against the execution model

use serde_json::{Map, Value};
use thiserror::Error;
use wx_adapters::{RenderedAction, ScriptEngine, ScriptError};
use wx_core::execution::rfc3339;
use wx_core::{ActionDef, ExecutionContext, HttpRequest, HttpRequestTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot render {field}: {source}")]
pub struct RenderError {
    pub field: String,
    #[source]
    pub source: ScriptError,
}

pub(crate) fn render_text<E: ScriptEngine>(
    scripts: &E,
    field: &str,
    template: &str,
    model: &Value,
) -> Result<String, RenderError> {
    if !is_template(template) {
        return Ok(template.to_string());
    }
    scripts.render(template, model).map_err(|source| RenderError {
        field: field.to_string(),
        source,
    })
}

fn is_template(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

pub(crate) fn render_request<E: ScriptEngine>(
    scripts: &E,
    template: &HttpRequestTemplate,
    model: &Value,
) -> Result<HttpRequest, RenderError> {
    let mut params = template.params.clone();
    for (key, value) in params.iter_mut() {
        *value = render_text(scripts, &format!("params.{key}"), value, model)?;
    }
    let mut headers = template.headers.clone();
    for (key, value) in headers.iter_mut() {
        *value = render_text(scripts, &format!("headers.{key}"), value, model)?;
    }
    let body = template
        .body
        .as_deref()
        .map(|body| render_text(scripts, "body", body, model))
        .transpose()?;

    Ok(HttpRequest {
        scheme: template.scheme,
        host: template.host.clone(),
        port: template.port,
        method: template.method,
        path: render_text(scripts, "path", &template.path, model)?,
        params,
        headers,
        body,
        auth: template.auth.clone(),
    })
}

/// Render every templated string leaf of a JSON value
pub(crate) fn render_value<E: ScriptEngine>(
    scripts: &E,
    field: &str,
    value: &Value,
    model: &Value,
) -> Result<Value, RenderError> {
    match value {
        Value::String(text) => render_text(scripts, field, text, model).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| render_value(scripts, &format!("{field}.{i}"), item, model))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut rendered = Map::with_capacity(map.len());
            for (key, item) in map {
                rendered.insert(
                    key.clone(),
                    render_value(scripts, &format!("{field}.{key}"), item, model)?,
                );
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

/// Render an action against its (possibly transformed) payload
pub fn render_action<E: ScriptEngine>(
    scripts: &E,
    action: &ActionDef,
    payload: &Value,
    ctx: &ExecutionContext,
) -> Result<RenderedAction, RenderError> {
    let model = ctx.model_with_payload(payload);
    match action {
        ActionDef::Logging {
            text,
            level,
            category,
        } => Ok(RenderedAction::Logging {
            level: *level,
            category: category
                .as_deref()
                .map(|c| render_text(scripts, "category", c, &model))
                .transpose()?,
            text: render_text(scripts, "text", text, &model)?,
        }),
        ActionDef::Webhook { request } => Ok(RenderedAction::Webhook {
            request: render_request(scripts, request, &model)?,
        }),
        ActionDef::Index {
            index,
            doc_id,
            execution_time_field,
        } => {
            let mut document = payload.clone();
            if let (Some(field), Value::Object(map)) = (execution_time_field, &mut document) {
                map.insert(field.clone(), Value::String(rfc3339(ctx.execution_time)));
            }
            Ok(RenderedAction::Index {
                index: render_text(scripts, "index", index, &model)?,
                doc_id: doc_id
                    .as_deref()
                    .map(|id| render_text(scripts, "doc_id", id, &model))
                    .transpose()?,
                document,
            })
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

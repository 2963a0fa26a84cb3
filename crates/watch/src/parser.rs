// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch definition parsing (TOML or JSON)

use crate::validator::{validate_watch, ValidationErrors};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use wx_core::Watch;

/// Errors that can occur during watch parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source format of a watch definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Format from a file extension, if it is one we read
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Format::Toml),
            Some("json") => Some(Format::Json),
            _ => None,
        }
    }
}

/// Parse and validate a watch definition.
///
/// When the document has no `id`, `default_id` is used (the loader passes the
/// file stem). Any status in the document is kept; definitions normally omit it.
pub fn parse_watch(
    content: &str,
    format: Format,
    default_id: Option<&str>,
) -> Result<Watch, ParseError> {
    let mut raw: Value = match format {
        Format::Toml => toml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };

    let table = raw
        .as_object_mut()
        .ok_or_else(|| ParseError::InvalidFormat("root must be a table".to_string()))?;

    if !table.contains_key("id") {
        let id = default_id.ok_or_else(|| ParseError::MissingField("id".to_string()))?;
        table.insert("id".to_string(), Value::String(id.to_string()));
    }
    if !table.contains_key("trigger") {
        return Err(ParseError::MissingField("trigger".to_string()));
    }

    let id = table
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut watch: Watch = serde_json::from_value(raw)
        .map_err(|e| ParseError::InvalidFormat(format!("watch {}: {}", id, e)))?;

    validate_watch(&watch)?;

    watch.sync_status();
    Ok(watch)
}

pub fn parse_watch_toml(content: &str) -> Result<Watch, ParseError> {
    parse_watch(content, Format::Toml, None)
}

pub fn parse_watch_json(content: &str) -> Result<Watch, ParseError> {
    parse_watch(content, Format::Json, None)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;

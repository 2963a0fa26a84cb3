// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input, condition and transform definitions

use super::HttpRequestTemplate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::time::Duration;

/// Produces the initial payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputDef {
    #[default]
    None,
    Simple {
        #[serde(default)]
        payload: Map<String, Value>,
    },
    Search {
        indices: Vec<String>,
        #[serde(default)]
        body: Value,
        #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
        timeout: Option<Duration>,
    },
    Http {
        request: HttpRequestTemplate,
        #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
        timeout: Option<Duration>,
    },
    Chain {
        inputs: Vec<NamedInput>,
    },
}

impl InputDef {
    pub fn input_type(&self) -> &'static str {
        match self {
            InputDef::None => "none",
            InputDef::Simple { .. } => "simple",
            InputDef::Search { .. } => "search",
            InputDef::Http { .. } => "http",
            InputDef::Chain { .. } => "chain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedInput {
    pub name: String,
    #[serde(flatten)]
    pub input: InputDef,
}

/// Decides whether actions run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionDef {
    #[default]
    Always,
    Never,
    /// Compare the value at a dotted path in the execution model
    Compare {
        path: String,
        op: CompareOp,
        value: Value,
    },
    /// Boolean expression evaluated by the script engine
    Script {
        source: String,
    },
}

impl ConditionDef {
    pub fn condition_type(&self) -> &'static str {
        match self {
            ConditionDef::Always => "always",
            ConditionDef::Never => "never",
            ConditionDef::Compare { .. } => "compare",
            ConditionDef::Script { .. } => "script",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Compare `actual` against `expected`.
    ///
    /// Numbers compare numerically and strings lexically. Ordering operators
    /// on values of different kinds (or on null) never match.
    pub fn matches(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            CompareOp::Eq => values_equal(actual, expected),
            CompareOp::NotEq => !values_equal(actual, expected),
            CompareOp::Gt => order(actual, expected) == Some(Ordering::Greater),
            CompareOp::Gte => matches!(order(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
            CompareOp::Lt => order(actual, expected) == Some(Ordering::Less),
            CompareOp::Lte => matches!(order(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Maps a payload to a new payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformDef {
    /// Expression whose value becomes the payload
    Script { source: String },
    /// Query result becomes the payload
    Search {
        indices: Vec<String>,
        #[serde(default)]
        body: Value,
        #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
        timeout: Option<Duration>,
    },
    Chain { transforms: Vec<TransformDef> },
}

impl TransformDef {
    pub fn transform_type(&self) -> &'static str {
        match self {
            TransformDef::Script { .. } => "script",
            TransformDef::Search { .. } => "search",
            TransformDef::Chain { .. } => "chain",
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template and expression evaluation

mod jinja;

pub use jinja::JinjaScriptEngine;

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors from compiling or executing a script
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("compile error: {0}")]
    Compile(String),
    #[error("undefined value: {0}")]
    Undefined(String),
    #[error("execution error: {0}")]
    Execution(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Text with `{{ .. }}` interpolations; renders to a string
    Template,
    /// A single expression; evaluates to a value
    Expression,
}

/// A script that passed compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    kind: ScriptKind,
    source: Arc<str>,
}

impl CompiledScript {
    pub fn new(kind: ScriptKind, source: &str) -> Self {
        Self {
            kind,
            source: Arc::from(source),
        }
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compiles and runs templates and expressions against a JSON model
pub trait ScriptEngine: Clone + Send + Sync + 'static {
    fn compile(&self, kind: ScriptKind, source: &str) -> Result<CompiledScript, ScriptError>;

    /// Templates yield a JSON string, expressions any JSON value
    fn execute(&self, script: &CompiledScript, model: &Value) -> Result<Value, ScriptError>;

    fn render(&self, template: &str, model: &Value) -> Result<String, ScriptError> {
        let script = self.compile(ScriptKind::Template, template)?;
        match self.execute(&script, model)? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    fn eval(&self, expression: &str, model: &Value) -> Result<Value, ScriptError> {
        let script = self.compile(ScriptKind::Expression, expression)?;
        self.execute(&script, model)
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;

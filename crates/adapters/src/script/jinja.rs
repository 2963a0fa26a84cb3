// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jinja2-style scripts via minijinja
//!
//! - Templates: `{{ ctx.payload.count }}`, `{% if .. %}..{% endif %}`, filters
//! - Expressions: `ctx.payload.count > 10`, `ctx.payload.hits | length`
//!
//! Undefined values are errors, never silently empty.

use super::{CompiledScript, ScriptEngine, ScriptError, ScriptKind};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct JinjaScriptEngine {
    env: Arc<Environment<'static>>,
}

impl Default for JinjaScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl JinjaScriptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env: Arc::new(env) }
    }
}

impl ScriptEngine for JinjaScriptEngine {
    fn compile(&self, kind: ScriptKind, source: &str) -> Result<CompiledScript, ScriptError> {
        match kind {
            ScriptKind::Template => {
                self.env.template_from_str(source).map_err(compile_error)?;
            }
            ScriptKind::Expression => {
                self.env.compile_expression(source).map_err(compile_error)?;
            }
        }
        Ok(CompiledScript::new(kind, source))
    }

    fn execute(&self, script: &CompiledScript, model: &Value) -> Result<Value, ScriptError> {
        match script.kind() {
            ScriptKind::Template => self
                .env
                .render_str(script.source(), model)
                .map(Value::String)
                .map_err(execution_error),
            ScriptKind::Expression => {
                let expr = self
                    .env
                    .compile_expression(script.source())
                    .map_err(compile_error)?;
                let value = expr.eval(model).map_err(execution_error)?;
                serde_json::to_value(&value).map_err(|e| ScriptError::Execution(e.to_string()))
            }
        }
    }
}

fn compile_error(err: minijinja::Error) -> ScriptError {
    ScriptError::Compile(err.to_string())
}

fn execution_error(err: minijinja::Error) -> ScriptError {
    match err.kind() {
        ErrorKind::SyntaxError => ScriptError::Compile(err.to_string()),
        ErrorKind::UndefinedError => ScriptError::Undefined(err.to_string()),
        _ => ScriptError::Execution(err.to_string()),
    }
}

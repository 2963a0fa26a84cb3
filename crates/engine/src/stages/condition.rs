// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{StageError, Stages};
use crate::render::render_value;
use serde_json::{json, Value};
use wx_adapters::{DataSource, ScriptEngine};
use wx_core::execution::resolve_path;
use wx_core::{ConditionDef, ConditionResult};

impl<D: DataSource, E: ScriptEngine> Stages<D, E> {
    /// Evaluate a condition against an execution model
    pub fn condition(&self, def: &ConditionDef, model: &Value) -> Result<ConditionResult, StageError> {
        match def {
            ConditionDef::Always => Ok(ConditionResult::met(true)),
            ConditionDef::Never => Ok(ConditionResult::met(false)),
            ConditionDef::Compare { path, op, value } => {
                let actual = resolve_path(model, path).cloned().unwrap_or(Value::Null);
                let expected = render_value(&self.scripts, "value", value, model)?;
                Ok(ConditionResult {
                    met: op.matches(&actual, &expected),
                    data: json!({ "resolved_value": actual }),
                })
            }
            ConditionDef::Script { source } => match self.scripts.eval(source, model)? {
                Value::Bool(met) => Ok(ConditionResult::met(met)),
                other => Err(StageError::Invalid(format!(
                    "condition script must return a boolean, got {other}"
                ))),
            },
        }
    }
}

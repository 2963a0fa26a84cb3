// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic validation for watch definitions.
//!
//! Serde already rejects unknown stage and action types and malformed
//! schedules. This catches what types alone cannot: duplicate ids, empty
//! required strings and unusable identifiers.

use std::collections::HashSet;
use wx_core::{ActionDef, ConditionDef, InputDef, TransformDef, Watch};

/// Collection of validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub watch_id: String,
    pub errors: Vec<ValidationError>,
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "watch '{}' failed validation with {} error(s):",
            self.watch_id,
            self.errors.len()
        )?;
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "  {}: {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A single validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidId { id: String },
    DuplicateActionId { id: String },
    DuplicateInputName { name: String },
    EmptyField { field: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidId { id } => write!(
                f,
                "invalid id '{}': use letters, digits, '-', '_' or '.'",
                id
            ),
            ValidationError::DuplicateActionId { id } => {
                write!(f, "duplicate action id '{}'", id)
            }
            ValidationError::DuplicateInputName { name } => {
                write!(f, "duplicate chain input name '{}'", name)
            }
            ValidationError::EmptyField { field } => write!(f, "{} must not be empty", field),
        }
    }
}

pub fn validate_watch(watch: &Watch) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if !is_valid_id(&watch.id) {
        errors.push(ValidationError::InvalidId {
            id: watch.id.clone(),
        });
    }

    check_input(&watch.input, "input", &mut errors);
    check_condition(&watch.condition, "condition", &mut errors);
    if let Some(transform) = &watch.transform {
        check_transform(transform, "transform", &mut errors);
    }

    let mut seen = HashSet::new();
    for action in &watch.actions {
        if !is_valid_id(&action.id) {
            errors.push(ValidationError::InvalidId {
                id: action.id.clone(),
            });
        }
        if !seen.insert(action.id.as_str()) {
            errors.push(ValidationError::DuplicateActionId {
                id: action.id.clone(),
            });
        }

        let scope = format!("actions.{}", action.id);
        match &action.kind {
            ActionDef::Logging { text, .. } => require(text, &scope, "text", &mut errors),
            ActionDef::Webhook { request } => {
                require(&request.host, &scope, "request.host", &mut errors)
            }
            ActionDef::Index { index, .. } => require(index, &scope, "index", &mut errors),
        }
        if let Some(condition) = &action.condition {
            check_condition(condition, &format!("{}.condition", scope), &mut errors);
        }
        if let Some(transform) = &action.transform {
            check_transform(transform, &format!("{}.transform", scope), &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors {
            watch_id: watch.id.clone(),
            errors,
        })
    }
}

fn check_input(input: &InputDef, scope: &str, errors: &mut Vec<ValidationError>) {
    match input {
        InputDef::None | InputDef::Simple { .. } => {}
        InputDef::Search { indices, .. } => {
            if indices.is_empty() {
                errors.push(empty(scope, "indices"));
            }
        }
        InputDef::Http { request, .. } => require(&request.host, scope, "request.host", errors),
        InputDef::Chain { inputs } => {
            if inputs.is_empty() {
                errors.push(empty(scope, "inputs"));
            }
            let mut names = HashSet::new();
            for named in inputs {
                require(&named.name, scope, "inputs.name", errors);
                if !names.insert(named.name.as_str()) {
                    errors.push(ValidationError::DuplicateInputName {
                        name: named.name.clone(),
                    });
                }
                check_input(&named.input, &format!("{}.{}", scope, named.name), errors);
            }
        }
    }
}

fn check_condition(condition: &ConditionDef, scope: &str, errors: &mut Vec<ValidationError>) {
    match condition {
        ConditionDef::Always | ConditionDef::Never => {}
        ConditionDef::Compare { path, .. } => require(path, scope, "path", errors),
        ConditionDef::Script { source } => require(source, scope, "source", errors),
    }
}

fn check_transform(transform: &TransformDef, scope: &str, errors: &mut Vec<ValidationError>) {
    match transform {
        TransformDef::Script { source } => require(source, scope, "source", errors),
        TransformDef::Search { indices, .. } => {
            if indices.is_empty() {
                errors.push(empty(scope, "indices"));
            }
        }
        TransformDef::Chain { transforms } => {
            for (i, inner) in transforms.iter().enumerate() {
                check_transform(inner, &format!("{}.{}", scope, i), errors);
            }
        }
    }
}

fn require(value: &str, scope: &str, field: &str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(empty(scope, field));
    }
}

fn empty(scope: &str, field: &str) -> ValidationError {
    ValidationError::EmptyField {
        field: format!("{}.{}", scope, field),
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

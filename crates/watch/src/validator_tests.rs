// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::{json, Value};
use yare::parameterized;

fn watch(value: Value) -> Watch {
    serde_json::from_value(value).unwrap()
}

fn base() -> Value {
    json!({
        "id": "orders",
        "trigger": { "schedule": { "interval": "1m" } },
        "actions": [{ "id": "log", "type": "logging", "text": "hi" }]
    })
}

#[test]
fn valid_watch_passes() {
    assert!(validate_watch(&watch(base())).is_ok());
}

#[parameterized(
    space = { "has space" },
    slash = { "a/b" },
    empty = { "" },
)]
fn invalid_watch_ids_are_rejected(id: &str) {
    let mut value = base();
    value["id"] = json!(id);
    let errors = validate_watch(&watch(value)).unwrap_err();
    assert_eq!(errors.errors, vec![ValidationError::InvalidId { id: id.to_string() }]);
}

#[test]
fn duplicate_action_ids_are_rejected() {
    let mut value = base();
    value["actions"] = json!([
        { "id": "log", "type": "logging", "text": "a" },
        { "id": "log", "type": "logging", "text": "b" },
    ]);
    let errors = validate_watch(&watch(value)).unwrap_err();
    assert_eq!(
        errors.errors,
        vec![ValidationError::DuplicateActionId { id: "log".to_string() }]
    );
}

#[test]
fn empty_required_fields_are_collected() {
    let mut value = base();
    value["condition"] = json!({ "type": "script", "source": " " });
    value["actions"] = json!([
        { "id": "log", "type": "logging", "text": "" },
        { "id": "idx", "type": "index", "index": "" },
    ]);

    let errors = validate_watch(&watch(value)).unwrap_err();
    let fields: Vec<String> = errors
        .errors
        .iter()
        .map(|e| match e {
            ValidationError::EmptyField { field } => field.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        fields,
        vec!["condition.source", "actions.log.text", "actions.idx.index"]
    );
}

#[test]
fn chain_input_names_must_be_unique() {
    let mut value = base();
    value["input"] = json!({
        "type": "chain",
        "inputs": [
            { "name": "a", "type": "none" },
            { "name": "a", "type": "none" },
        ]
    });
    let errors = validate_watch(&watch(value)).unwrap_err();
    assert_eq!(
        errors.errors,
        vec![ValidationError::DuplicateInputName { name: "a".to_string() }]
    );
}

#[test]
fn errors_display_numbered_list() {
    let mut value = base();
    value["id"] = json!("bad id");
    let errors = validate_watch(&watch(value)).unwrap_err();
    let text = errors.to_string();
    assert!(text.contains("watch 'bad id' failed validation with 1 error(s)"));
    assert!(text.contains("  1: invalid id 'bad id'"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use wx_core::{ActionDef, AckState, CompareOp, ConditionDef, InputDef, Schedule};

const DISK_WATCH: &str = r#"
id = "disk_usage"
throttle_period = "15m"

[trigger.schedule]
cron = ["0 * * * *", "30 * * * *"]

[input]
type = "http"
[input.request]
host = "metrics.local"
port = 9100
path = "/disk"

[condition]
type = "compare"
path = "ctx.payload.used_pct"
op = "gte"
value = 90

[metadata]
team = "infra"

[[actions]]
id = "log"
type = "logging"
text = "disk at {{ ctx.payload.used_pct }}%"
level = "warn"

[[actions]]
id = "page"
type = "webhook"
throttle_period = "1h"
[actions.request]
scheme = "https"
host = "pager.example.com"
method = "POST"
path = "/v1/events"
body = '{"watch": "{{ ctx.watch_id }}"}'
[actions.request.headers]
Content-Type = "application/json"
"#;

#[test]
fn parses_full_toml_watch() {
    let watch = parse_watch_toml(DISK_WATCH).unwrap();

    assert_eq!(watch.id, "disk_usage");
    assert!(matches!(&watch.trigger.schedule, Schedule::Cron(exprs) if exprs.len() == 2));
    assert_eq!(watch.input.input_type(), "http");
    assert_eq!(
        watch.condition,
        ConditionDef::Compare {
            path: "ctx.payload.used_pct".to_string(),
            op: CompareOp::Gte,
            value: serde_json::json!(90),
        }
    );
    assert_eq!(watch.throttle_period, Some(Duration::from_secs(15 * 60)));
    assert_eq!(watch.metadata["team"], "infra");
    assert_eq!(watch.actions.len(), 2);
    assert_eq!(watch.actions[1].throttle_period, Some(Duration::from_secs(3600)));

    let ActionDef::Webhook { request } = &watch.actions[1].kind else {
        panic!("expected webhook action");
    };
    assert_eq!(request.headers["Content-Type"], "application/json");
}

#[test]
fn parsed_watch_has_status_for_every_action() {
    let watch = parse_watch_toml(DISK_WATCH).unwrap();
    assert_eq!(watch.status.actions.len(), 2);
    assert!(watch
        .status
        .actions
        .values()
        .all(|a| a.ack.state == AckState::AwaitsSuccessfulExecution));
}

#[test]
fn parses_json_watch() {
    let watch = parse_watch_json(
        r#"{
            "id": "heartbeat",
            "trigger": { "schedule": { "interval": "10s" } },
            "input": { "type": "simple", "payload": { "ok": true } },
            "actions": [{ "id": "log", "type": "logging", "text": "alive" }]
        }"#,
    )
    .unwrap();

    assert_eq!(watch.trigger.schedule, Schedule::Interval(Duration::from_secs(10)));
    assert!(matches!(watch.input, InputDef::Simple { .. }));
}

#[test]
fn default_id_fills_missing_id() {
    let content = r#"
[trigger.schedule]
interval = "1m"
"#;
    let watch = parse_watch(content, Format::Toml, Some("from_file")).unwrap();
    assert_eq!(watch.id, "from_file");

    let err = parse_watch_toml(content).unwrap_err();
    assert!(matches!(err, ParseError::MissingField(field) if field == "id"));
}

#[test]
fn missing_trigger_is_rejected() {
    let err = parse_watch_toml("id = \"x\"").unwrap_err();
    assert!(matches!(err, ParseError::MissingField(field) if field == "trigger"));
}

#[test]
fn infeasible_cron_is_a_configuration_error() {
    let content = r#"
id = "never"
[trigger.schedule]
cron = "0 0 30 2 *"
"#;
    let err = parse_watch_toml(content).unwrap_err();
    assert!(err.to_string().contains("can never fire"), "{err}");
}

#[test]
fn unknown_condition_type_is_a_configuration_error() {
    let content = r#"
id = "odd"
[trigger.schedule]
interval = "1m"
[condition]
type = "moon_phase"
"#;
    let err = parse_watch_toml(content).unwrap_err();
    assert!(matches!(err, ParseError::InvalidFormat(_)), "{err}");
}

#[test]
fn validation_errors_surface_through_parse() {
    let content = r#"
id = "dupes"
[trigger.schedule]
interval = "1m"
[[actions]]
id = "a"
type = "logging"
text = "one"
[[actions]]
id = "a"
type = "logging"
text = "two"
"#;
    let err = parse_watch_toml(content).unwrap_err();
    assert!(matches!(err, ParseError::Validation(_)), "{err}");
}

#[test]
fn invalid_toml_is_reported() {
    assert!(matches!(
        parse_watch_toml("id = ").unwrap_err(),
        ParseError::Toml(_)
    ));
}

#[test]
fn format_from_extension() {
    use std::path::Path;
    assert_eq!(Format::from_path(Path::new("a/b.toml")), Some(Format::Toml));
    assert_eq!(Format::from_path(Path::new("b.json")), Some(Format::Json));
    assert_eq!(Format::from_path(Path::new("README.md")), None);
}

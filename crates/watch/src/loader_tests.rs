// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

const INTERVAL_WATCH: &str = r#"
[trigger.schedule]
interval = "30s"

[[actions]]
id = "log"
type = "logging"
text = "tick"
"#;

fn write(dir: &TempDir, name: &str, content: &str) {
    std::fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn loads_toml_and_json_in_name_order() {
    let dir = TempDir::new().unwrap();
    write(&dir, "b_tick.toml", INTERVAL_WATCH);
    write(
        &dir,
        "a_json.json",
        r#"{ "trigger": { "schedule": { "interval": "1m" } } }"#,
    );
    write(&dir, "notes.txt", "ignored");

    let report = load_watches_dir(dir.path()).unwrap();

    let ids: Vec<&str> = report.watches.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["a_json", "b_tick"]);
    assert!(report.errors.is_empty());
}

#[test]
fn bad_file_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    write(&dir, "good.toml", INTERVAL_WATCH);
    write(&dir, "broken.toml", "trigger = ");

    let report = load_watches_dir(dir.path()).unwrap();

    assert_eq!(report.watches.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].0.ends_with("broken.toml"));
}

#[test]
fn duplicate_ids_across_files_are_reported() {
    let dir = TempDir::new().unwrap();
    let with_id = format!("id = \"same\"\n{}", INTERVAL_WATCH);
    write(&dir, "one.toml", &with_id);
    write(&dir, "two.toml", &with_id);

    let report = load_watches_dir(dir.path()).unwrap();

    assert_eq!(report.watches.len(), 1);
    assert!(report.errors[0].1.to_string().contains("duplicate watch id 'same'"));
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_watches_dir(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn single_file_uses_stem_as_id() {
    let dir = TempDir::new().unwrap();
    write(&dir, "heartbeat.toml", INTERVAL_WATCH);
    let watch = load_watch_file(&dir.path().join("heartbeat.toml")).unwrap();
    assert_eq!(watch.id, "heartbeat");
}

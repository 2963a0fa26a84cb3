// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{t0, watch_from, Harness, TestService};
use serde_json::json;
use std::time::Duration;
use wx_core::{AckState, TokioClock};

const WATCH_TOML: &str = r#"
[trigger.schedule]
interval = "10s"

[input]
type = "simple"
payload = { count = 2 }

[[actions]]
id = "log"
type = "logging"
text = "count is {{ ctx.payload.count }}"
"#;

async fn started(harness: &Harness) -> TestService<TokioClock> {
    let service = harness.service_with_clock(TokioClock::starting_at(t0()));
    let errors = service.start().await.unwrap();
    assert!(errors.is_empty());
    service
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn start_schedules_active_watches_only() {
    let harness = Harness::new();
    harness.put(&watch_from(json!({}))).await;
    let mut inactive = watch_from(json!({ "id": "inactive" }));
    inactive.status.set_active(false, t0());
    harness.put(&inactive).await;

    let service = started(&harness).await;
    tokio::time::sleep(Duration::from_secs(25)).await;
    settle().await;

    let records = harness.history.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.watch_id == "test-watch"));
    assert!(records.iter().all(|r| r.state == RecordState::Executed));
    assert!(service.stop().await);
}

#[tokio::test(start_paused = true)]
async fn put_watch_schedules_and_get_reports_it() {
    let harness = Harness::new();
    let service = started(&harness).await;

    let view = service.put_watch(watch_from(json!({}))).await.unwrap();
    assert!(view.scheduled);
    assert_eq!(view.next_fire, Some(t0() + chrono::Duration::seconds(10)));

    tokio::time::sleep(Duration::from_secs(11)).await;
    settle().await;

    let view = service.get_watch("test-watch").await.unwrap().unwrap();
    assert_eq!(view.last_record.unwrap().state, RecordState::Executed);
    assert_eq!(view.watch.status.last_checked, Some(t0() + chrono::Duration::seconds(10)));
    assert!(service.get_watch("ghost").await.unwrap().is_none());
    service.stop().await;
}

#[tokio::test]
async fn redefining_a_watch_keeps_its_status() {
    let harness = Harness::new();
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();
    service.execute_watch("test-watch", ExecuteRequest::default()).await.unwrap();

    let view = service
        .put_watch(watch_from(json!({
            "actions": [
                { "id": "log", "type": "logging", "text": "changed" },
                { "id": "extra", "type": "logging", "text": "new" }
            ]
        })))
        .await
        .unwrap();

    let status = &view.watch.status;
    assert!(status.last_checked.is_some());
    assert_eq!(status.action("log").unwrap().ack.state, AckState::Ackable);
    assert_eq!(status.action("extra").unwrap().ack.state, AckState::AwaitsSuccessfulExecution);
    service.stop().await;
}

#[tokio::test]
async fn invalid_watches_are_refused() {
    let harness = Harness::new();
    let service = started(&harness).await;

    let bad = watch_from(json!({
        "actions": [
            { "id": "dup", "type": "logging", "text": "a" },
            { "id": "dup", "type": "logging", "text": "b" }
        ]
    }));
    assert!(matches!(service.put_watch(bad).await, Err(EngineError::Parse(_))));

    let err = service
        .put_watch_source("[input]\ntype = \"simple\"", Format::Toml, Some("no-trigger"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Parse(ParseError::MissingField(ref f)) if f == "trigger"));
    assert!(service.list_watches().await.unwrap().is_empty());
    service.stop().await;
}

#[tokio::test]
async fn put_watch_source_takes_id_from_caller() {
    let harness = Harness::new();
    let service = started(&harness).await;

    let view = service
        .put_watch_source(WATCH_TOML, Format::Toml, Some("from-file"))
        .await
        .unwrap();
    assert_eq!(view.watch.id, "from-file");

    let record = service.execute_watch("from-file", ExecuteRequest::default()).await.unwrap();
    assert_eq!(record.state, RecordState::Executed);
    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn deleted_watch_stops_firing() {
    let harness = Harness::new();
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();

    assert!(service.delete_watch("test-watch").await.unwrap());
    assert!(!service.delete_watch("test-watch").await.unwrap());
    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;

    assert!(harness.history.records().is_empty());
    assert_eq!(service.stats().await.unwrap().scheduled_jobs, 0);
    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn deactivate_unschedules_and_activate_reschedules() {
    let harness = Harness::new();
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();

    let view = service.deactivate_watch("test-watch").await.unwrap();
    assert!(!view.scheduled);
    assert!(!view.watch.is_active());
    tokio::time::sleep(Duration::from_secs(25)).await;
    settle().await;
    assert!(harness.history.records().is_empty());

    let view = service.activate_watch("test-watch").await.unwrap();
    assert!(view.scheduled);
    assert!(harness.stored("test-watch").await.is_active());
    tokio::time::sleep(Duration::from_secs(11)).await;
    settle().await;
    assert_eq!(harness.history.states(), vec![RecordState::Executed]);
    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn busy_watch_is_reported_after_waiting() {
    let harness = Harness::new().with_config(|c| c.action_timeout = Duration::from_secs(60));
    harness.channel.set_delay(Duration::from_secs(5));
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.execute_watch("test-watch", ExecuteRequest::default()).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let busy = service.execute_watch("test-watch", ExecuteRequest::default()).await;
    assert!(matches!(busy, Err(EngineError::Busy(ref id)) if id == "test-watch"));
    let acked = service.ack_watch("test-watch", &[]).await;
    assert!(matches!(acked, Err(EngineError::Busy(_))));

    assert_eq!(first.await.unwrap().unwrap().state, RecordState::Executed);
    service.stop().await;
}

#[tokio::test]
async fn ack_and_missing_watches() {
    let harness = Harness::new();
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();
    service.execute_watch("test-watch", ExecuteRequest::default()).await.unwrap();

    let report = service.ack_watch("test-watch", &[]).await.unwrap();
    assert_eq!(report.acked, vec!["log"]);

    assert!(matches!(
        service.ack_watch("ghost", &[]).await,
        Err(EngineError::WatchNotFound(_))
    ));
    assert!(matches!(
        service.activate_watch("ghost").await,
        Err(EngineError::WatchNotFound(_))
    ));
    assert!(matches!(
        service.execute_watch("ghost", ExecuteRequest::default()).await,
        Err(EngineError::WatchNotFound(_))
    ));
    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stats_describe_the_service() {
    let harness = Harness::new().with_config(|c| {
        c.worker_pool_size = 3;
        c.action_timeout = Duration::from_secs(60);
    });
    harness.channel.set_delay(Duration::from_secs(5));
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();
    service.put_watch(watch_from(json!({ "id": "second" }))).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10_100)).await;
    settle().await;

    let stats = service.stats().await.unwrap();
    assert!(stats.running);
    assert_eq!(stats.watch_count, 2);
    assert_eq!(stats.scheduled_jobs, 2);
    assert_eq!(stats.pool_capacity, 3);
    assert_eq!(stats.pool_in_use, 2);
    assert_eq!(stats.current.len(), 2);
    assert_eq!(stats.rejected, 0);

    service.stop().await;
    assert!(!service.stats().await.unwrap().running);
}

#[tokio::test]
async fn stopped_service_refuses_manual_execution() {
    let harness = Harness::new();
    let service = started(&harness).await;
    service.put_watch(watch_from(json!({}))).await.unwrap();

    assert!(service.stop().await);
    assert!(!service.is_running());
    assert!(matches!(
        service.execute_watch("test-watch", ExecuteRequest::default()).await,
        Err(EngineError::Stopped)
    ));
}

#[test]
fn unknown_timezone_fails_construction() {
    let harness = Harness::new().with_config(|c| c.timezone = Some("Mars/Olympus".to_string()));
    let result = WatchService::new(
        harness.deps(),
        wx_core::FakeClock::at(t0()),
        wx_core::SequentialIdGen::new("exec"),
        harness.config.clone(),
    );
    assert!(matches!(result, Err(EngineError::Config(_))));
}

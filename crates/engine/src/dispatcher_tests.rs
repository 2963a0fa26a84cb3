// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{context, t0, watch_from};
use serde_json::{json, Value};
use wx_adapters::{FakeChannel, FakeDataSource, JinjaScriptEngine};
use wx_core::{ActionOutcome, AckState, FakeClock, SimulateSet};
use yare::parameterized;

type TestDispatcher = ActionDispatcher<FakeDataSource, JinjaScriptEngine, FakeClock>;

struct Fixture {
    dispatcher: TestDispatcher,
    channel: FakeChannel,
    clock: FakeClock,
}

fn fixture(default_throttle: Duration) -> Fixture {
    let channel = FakeChannel::new();
    let clock = FakeClock::at(t0());
    let stages = Stages::new(FakeDataSource::new(), JinjaScriptEngine::new(), Duration::from_secs(1));
    let channels = Channels::new()
        .with("logging", channel.clone())
        .with("webhook", channel.clone());
    Fixture {
        dispatcher: ActionDispatcher::new(stages, channels, clock.clone(), default_throttle, Duration::from_secs(1)),
        channel,
        clock,
    }
}

fn three_actions() -> Value {
    json!([
        { "id": "first", "type": "logging", "text": "one {{ ctx.payload.count }}" },
        { "id": "second", "type": "logging", "text": "two {{ ctx.payload.nope.deeper }}" },
        { "id": "third", "type": "logging", "text": "three" }
    ])
}

fn ctx_with(overrides: Value) -> ExecutionContext {
    let mut ctx = context(watch_from(overrides));
    ctx.payload = json!({ "count": 5 });
    ctx
}

fn outcomes(results: &[ActionResult]) -> Vec<(&str, ActionOutcome)> {
    results.iter().map(|r| (r.id.as_str(), r.outcome)).collect()
}

#[tokio::test]
async fn successful_action_becomes_ackable() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({}));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(outcomes(&results), vec![("log", ActionOutcome::Success)]);
    assert_eq!(results[0].response, Some(json!({ "sent": "log" })));
    let action = status.action("log").unwrap();
    assert_eq!(action.ack.state, AckState::Ackable);
    assert_eq!(action.last_successful_execution.as_ref().map(|e| e.timestamp), Some(t0()));

    let calls = f.channel.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].action,
        RenderedAction::Logging {
            level: Default::default(),
            category: None,
            text: "count is 5".to_string(),
        }
    );
}

#[tokio::test]
async fn one_failing_render_does_not_stop_the_others() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({ "actions": three_actions() }));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(
        outcomes(&results),
        vec![
            ("first", ActionOutcome::Success),
            ("second", ActionOutcome::Failure),
            ("third", ActionOutcome::Success),
        ]
    );
    assert!(results[1].reason.as_deref().unwrap().contains("cannot render text"));
    assert_eq!(f.channel.call_count(), 2);
    let second = status.action("second").unwrap();
    assert_eq!(second.last_execution.as_ref().map(|e| e.successful), Some(false));
}

#[tokio::test]
async fn full_simulation_never_touches_channels() {
    let f = fixture(Duration::ZERO);
    let mut ctx = ctx_with(json!({
        "actions": [
            { "id": "first", "type": "logging", "text": "one" },
            { "id": "hook", "type": "webhook", "request": { "host": "example.com", "path": "/{{ ctx.payload.count }}" } }
        ]
    }));
    ctx.simulate = SimulateSet::All;
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(
        outcomes(&results),
        vec![("first", ActionOutcome::Simulated), ("hook", ActionOutcome::Simulated)]
    );
    assert_eq!(results[1].request.as_ref().unwrap()["request"]["path"], "/5");
    assert_eq!(f.channel.call_count(), 0);
    assert_eq!(status, ctx.watch.status);
}

#[tokio::test]
async fn partial_simulation_dispatches_the_rest() {
    let f = fixture(Duration::ZERO);
    let mut ctx = ctx_with(json!({ "actions": three_actions() }));
    ctx.simulate = SimulateSet::only(["first"]);
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Simulated);
    assert_eq!(results[2].outcome, ActionOutcome::Success);
    let calls: Vec<String> = f.channel.calls().into_iter().map(|c| c.action_id).collect();
    assert_eq!(calls, vec!["third"]);
}

#[tokio::test]
async fn action_condition_gates_only_that_action() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({
        "actions": [
            { "id": "big", "type": "logging", "text": "big",
              "condition": { "type": "compare", "path": "ctx.payload.count", "op": "gt", "value": 10 } },
            { "id": "small", "type": "logging", "text": "small",
              "condition": { "type": "compare", "path": "ctx.payload.count", "op": "lte", "value": 10 } }
        ]
    }));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(
        outcomes(&results),
        vec![("big", ActionOutcome::ConditionNotMet), ("small", ActionOutcome::Success)]
    );
    assert!(status.action("big").unwrap().last_execution.is_none());
}

#[tokio::test]
async fn action_transform_shapes_rendered_payload() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({
        "actions": [{
            "id": "log",
            "type": "logging",
            "text": "total {{ ctx.payload.total }}",
            "transform": { "type": "script", "source": "{'total': ctx.payload.count * 3}" }
        }]
    }));
    let mut status = ctx.watch.status.clone();

    f.dispatcher.dispatch(&ctx, &mut status).await;

    let RenderedAction::Logging { text, .. } = &f.channel.calls()[0].action else {
        panic!("expected logging");
    };
    assert_eq!(text, "total 15");
}

#[parameterized(
    inside_period = { 5, ActionOutcome::Throttled },
    at_period = { 10, ActionOutcome::Success },
    after_period = { 11, ActionOutcome::Success },
)]
fn throttle_counts_from_last_success(after_secs: u64, expected: ActionOutcome) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    runtime.block_on(async {
        let f = fixture(Duration::ZERO);
        let ctx = ctx_with(json!({ "throttle_period": "10s" }));
        let mut status = ctx.watch.status.clone();
        f.dispatcher.dispatch(&ctx, &mut status).await;

        f.clock.advance(Duration::from_secs(after_secs));
        let results = f.dispatcher.dispatch(&ctx, &mut status).await;
        assert_eq!(results[0].outcome, expected);
    });
}

#[tokio::test]
async fn throttled_action_records_reason() {
    let f = fixture(Duration::from_secs(60));
    let ctx = ctx_with(json!({}));
    let mut status = ctx.watch.status.clone();
    f.dispatcher.dispatch(&ctx, &mut status).await;

    f.clock.advance(Duration::from_secs(2));
    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Throttled);
    let reason = results[0].reason.as_deref().unwrap();
    assert!(reason.contains("[1m]"), "{reason}");
    assert_eq!(status.action("log").unwrap().last_throttle.as_ref().unwrap().reason, reason);
    assert_eq!(f.channel.call_count(), 1);
}

#[tokio::test]
async fn simulated_actions_leave_status_alone() {
    let f = fixture(Duration::from_secs(60));
    let mut ctx = ctx_with(json!({
        "actions": [
            { "id": "log", "type": "logging", "text": "x" },
            { "id": "bad", "type": "logging", "text": "{{ ctx.payload.nope.deeper }}" }
        ]
    }));
    let mut status = ctx.watch.status.clone();
    f.dispatcher.dispatch(&ctx, &mut status).await;
    let before = status.clone();

    f.clock.advance(Duration::from_secs(2));
    ctx.simulate = SimulateSet::All;
    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(
        outcomes(&results),
        vec![("log", ActionOutcome::Throttled), ("bad", ActionOutcome::Failure)]
    );
    assert_eq!(status, before);
    assert!(status.action("log").unwrap().last_throttle.is_none());
}

#[tokio::test]
async fn action_throttle_overrides_watch_throttle() {
    let f = fixture(Duration::from_secs(60));
    let ctx = ctx_with(json!({
        "throttle_period": "1h",
        "actions": [{ "id": "log", "type": "logging", "text": "x", "throttle_period": "0s" }]
    }));
    let mut status = ctx.watch.status.clone();

    f.dispatcher.dispatch(&ctx, &mut status).await;
    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Success);
    assert_eq!(f.channel.call_count(), 2);
}

#[tokio::test]
async fn failed_sends_are_retried_next_time() {
    let f = fixture(Duration::from_secs(60));
    f.channel.fail_action("log", ChannelError::Status { status: 503, body: "down".into() });
    let ctx = ctx_with(json!({}));
    let mut status = ctx.watch.status.clone();

    let first = f.dispatcher.dispatch(&ctx, &mut status).await;
    f.clock.advance(Duration::from_secs(1));
    let second = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(first[0].outcome, ActionOutcome::Failure);
    assert_eq!(second[0].outcome, ActionOutcome::Failure);
    assert_eq!(f.channel.call_count(), 2);
    assert_eq!(status.action("log").unwrap().ack.state, AckState::AwaitsSuccessfulExecution);
}

#[tokio::test]
async fn acked_action_is_throttled_until_reset() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({}));
    let mut status = ctx.watch.status.clone();
    f.dispatcher.dispatch(&ctx, &mut status).await;
    status.acknowledge(&[], t0());

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;
    assert_eq!(results[0].outcome, ActionOutcome::Throttled);
    assert!(results[0].reason.as_deref().unwrap().contains("acknowledged"));

    status.on_check(false, t0());
    let results = f.dispatcher.dispatch(&ctx, &mut status).await;
    assert_eq!(results[0].outcome, ActionOutcome::Success);
}

#[tokio::test]
async fn missing_channel_fails_the_action() {
    let f = fixture(Duration::ZERO);
    let ctx = ctx_with(json!({
        "actions": [
            { "id": "store", "type": "index", "index": "alerts" },
            { "id": "log", "type": "logging", "text": "still runs" }
        ]
    }));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Failure);
    assert_eq!(
        results[0].reason.as_deref(),
        Some("channel not configured for action type 'index'")
    );
    assert!(results[0].request.is_some());
    assert_eq!(results[1].outcome, ActionOutcome::Success);
}

#[tokio::test]
async fn panicking_channel_is_an_action_failure() {
    let f = fixture(Duration::ZERO);
    f.channel.panic_on("first");
    let ctx = ctx_with(json!({
        "actions": [
            { "id": "first", "type": "logging", "text": "boom" },
            { "id": "second", "type": "logging", "text": "fine" }
        ]
    }));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Failure);
    assert!(results[0].reason.as_deref().unwrap().contains("channel panicked"));
    assert_eq!(results[1].outcome, ActionOutcome::Success);
}

#[tokio::test(start_paused = true)]
async fn slow_channel_times_out() {
    let f = fixture(Duration::ZERO);
    f.channel.set_delay(Duration::from_secs(30));
    let ctx = ctx_with(json!({}));
    let mut status = ctx.watch.status.clone();

    let results = f.dispatcher.dispatch(&ctx, &mut status).await;

    assert_eq!(results[0].outcome, ActionOutcome::Failure);
    assert_eq!(
        results[0].reason.as_deref(),
        Some(ChannelError::Timeout(Duration::from_secs(1)).to_string().as_str())
    );
}

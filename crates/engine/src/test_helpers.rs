// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::config::EngineConfig;
use crate::runner::{ExecutionRunner, RunnerDeps};
use crate::service::WatchService;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use wx_adapters::{
    Channels, FakeChannel, FakeDataSource, FakeHistory, JinjaScriptEngine, MemoryRegistry,
    StaticGate, WatchRegistry,
};
use wx_core::{Clock, ExecutionContext, FakeClock, SequentialIdGen, TriggerEvent, Watch};

pub(crate) type TestRunner<C = FakeClock> = ExecutionRunner<
    MemoryRegistry,
    FakeDataSource,
    JinjaScriptEngine,
    FakeHistory,
    StaticGate,
    C,
    SequentialIdGen,
>;

pub(crate) type TestService<C> = WatchService<
    MemoryRegistry,
    FakeDataSource,
    JinjaScriptEngine,
    FakeHistory,
    StaticGate,
    C,
    SequentialIdGen,
>;

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A watch with a simple `{"count": 5}` input and one logging action
pub(crate) fn watch_json() -> Value {
    json!({
        "id": "test-watch",
        "trigger": { "schedule": { "interval": "10s" } },
        "input": { "type": "simple", "payload": { "count": 5 } },
        "actions": [
            { "id": "log", "type": "logging", "text": "count is {{ ctx.payload.count }}" }
        ]
    })
}

/// `watch_json()` with top-level keys replaced by `overrides`
pub(crate) fn watch_from(overrides: Value) -> Watch {
    let mut value = watch_json();
    if let (Value::Object(base), Value::Object(extra)) = (&mut value, overrides) {
        base.extend(extra);
    }
    let mut watch: Watch = serde_json::from_value(value).unwrap();
    watch.sync_status();
    watch
}

pub(crate) fn context(watch: Watch) -> ExecutionContext {
    let trigger = TriggerEvent::manual(&watch.id, t0());
    ExecutionContext::new("exec-1", watch, trigger, t0())
}

/// Fakes for every collaborator, shared by the runners built from it
#[derive(Clone)]
pub(crate) struct Harness {
    pub registry: MemoryRegistry,
    pub source: FakeDataSource,
    pub history: FakeHistory,
    pub gate: StaticGate,
    pub channel: FakeChannel,
    pub clock: FakeClock,
    pub config: EngineConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            registry: MemoryRegistry::new(),
            source: FakeDataSource::new(),
            history: FakeHistory::new(),
            gate: StaticGate::new(true),
            channel: FakeChannel::new(),
            clock: FakeClock::at(t0()),
            config: EngineConfig {
                default_throttle_period: Duration::ZERO,
                manual_wait: Duration::from_millis(500),
                action_timeout: Duration::from_secs(1),
                input_timeout: Duration::from_secs(1),
                stop_timeout: Duration::from_secs(1),
                ..EngineConfig::default()
            },
        }
    }

    pub fn with_config(mut self, apply: impl FnOnce(&mut EngineConfig)) -> Self {
        apply(&mut self.config);
        self
    }

    /// Logging and webhook actions go to the fake channel; `index` has no channel
    pub fn deps(&self) -> RunnerDeps<MemoryRegistry, FakeDataSource, JinjaScriptEngine, FakeHistory, StaticGate> {
        RunnerDeps {
            registry: self.registry.clone(),
            source: self.source.clone(),
            scripts: JinjaScriptEngine::new(),
            history: self.history.clone(),
            gate: self.gate.clone(),
            channels: Channels::new()
                .with("logging", self.channel.clone())
                .with("webhook", self.channel.clone()),
        }
    }

    /// A started runner on the harness's fake clock
    pub fn runner(&self) -> TestRunner {
        self.runner_with_clock(self.clock.clone())
    }

    pub fn runner_with_clock<C: Clock>(&self, clock: C) -> TestRunner<C> {
        let runner = ExecutionRunner::new(
            self.deps(),
            clock,
            SequentialIdGen::new("exec"),
            self.config.clone(),
        );
        runner.start();
        runner
    }

    pub fn service_with_clock<C: Clock>(&self, clock: C) -> TestService<C> {
        WatchService::new(self.deps(), clock, SequentialIdGen::new("exec"), self.config.clone()).unwrap()
    }

    pub async fn put(&self, watch: &Watch) {
        self.registry.put(watch).await.unwrap();
    }

    pub async fn stored(&self, watch_id: &str) -> Watch {
        self.registry.load(watch_id).await.unwrap().unwrap()
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wx-core: Core types for the watch execution engine
//!
//! This crate provides:
//! - Clock and id abstractions
//! - Schedule evaluation (intervals and cron expressions)
//! - Watch definitions and their stage/action variants
//! - Watch status and the per-action ack state machine
//! - Trigger events, execution context and execution records
//!
//! Nothing here performs I/O.

pub mod clock;
pub mod id;

pub mod schedule;
pub mod watch;

// State (order matters for dependencies)
pub mod execution;
pub mod status;
pub mod trigger;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock, TokioClock};
pub use execution::{
    ActionOutcome, ActionResult, ConditionResult, ExecuteRequest, ExecutionContext,
    ExecutionPhase, ExecutionRecord, ExecutionResult, RecordState, SimulateSet, Stage,
    StageFailure,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use schedule::{CronExpr, Schedule, ScheduleError, ScheduleZone};
pub use status::{AckEvent, AckReport, AckState, AckStatus, ActionStatus, WatchStatus};
pub use trigger::{TriggerEvent, TriggerKind};
pub use watch::{
    ActionDef, ActionEntry, CompareOp, ConditionDef, HttpMethod, HttpRequest,
    HttpRequestTemplate, InputDef, TransformDef, Watch,
};

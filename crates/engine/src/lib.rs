// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Watch execution engine
//!
//! - [`TriggerEngine`]: timers for every scheduled watch, fanned out to listeners
//! - [`ExecutionRunner`]: runs one firing through input, condition, transform
//!   and actions, guarding against overlapping runs of the same watch
//! - [`ActionDispatcher`]: per-action condition, throttle, transform, render
//!   and channel invocation
//! - [`WatchService`]: the control surface used by hosts

mod config;
mod dispatcher;
mod error;
mod guard;
mod pool;
mod render;
mod runner;
mod service;
mod stages;
mod stats;
mod trigger;

pub use config::EngineConfig;
pub use dispatcher::ActionDispatcher;
pub use error::EngineError;
pub use render::{render_action, RenderError};
pub use runner::{ExecutionRunner, RunnerDeps};
pub use service::WatchService;
pub use stages::{StageError, Stages};
pub use stats::{CurrentExecution, EngineStats, WatchView};
pub use trigger::{TriggerEngine, TriggerError, TriggerJob, TriggerListener};

#[cfg(test)]
mod test_helpers;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use crate::trigger::TriggerError;
use thiserror::Error;
use wx_adapters::RegistryError;
use wx_core::ScheduleError;
use wx_watch::ParseError;

/// Errors surfaced by the control surface
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("watch not found: {0}")]
    WatchNotFound(String),
    #[error("watch {0} is busy; try again later")]
    Busy(String),
    #[error("engine is stopped")]
    Stopped,
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ScheduleError),
    #[error("invalid watch: {0}")]
    Parse(#[from] ParseError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("trigger error: {0}")]
    Trigger(#[from] TriggerError),
}

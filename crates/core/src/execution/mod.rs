// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context, results and history records

mod context;
mod result;

pub use context::{
    as_payload, resolve_path, rfc3339, ExecuteRequest, ExecutionContext, ExecutionPhase,
    SimulateSet,
};
pub use result::{
    ActionOutcome, ActionResult, ConditionResult, ExecutionRecord, ExecutionResult, RecordState,
    Stage, StageFailure,
};

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wx-storage: durable, file-backed implementations of the engine's
//! collaborators
//!
//! - [`WalRegistry`]: watch definitions and statuses in a write-ahead log
//! - [`HistoryLog`]: execution records as JSON lines
//! - [`DocumentIndex`]: a local document store backing index actions and
//!   search inputs

mod history;
mod index;
mod registry;
mod state;
mod wal;

pub use history::HistoryLog;
pub use index::DocumentIndex;
pub use registry::WalRegistry;
pub use state::MaterializedState;
pub use wal::{StoreOp, Wal, WalError};

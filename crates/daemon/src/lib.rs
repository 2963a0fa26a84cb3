// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Host process for the watch engine: configuration, state directory,
//! durable collaborators and watch-directory sync

pub mod config;
pub mod lifecycle;

pub use config::Config;
pub use lifecycle::{startup, sync_watches, Daemon, DaemonService, LifecycleError, SyncReport};

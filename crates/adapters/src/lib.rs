// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Collaborators of the watch engine: registry, data sources, notification
//! channels, script evaluation, history and feature gating

pub mod channel;
pub mod gate;
pub mod history;
mod http;
pub mod registry;
pub mod script;
pub mod source;
pub mod traced;

pub use channel::{
    ChannelError, Channels, LoggingChannel, NoOpChannel, NotifyChannel, RenderedAction,
    WebhookChannel,
};
pub use gate::{AlwaysAllow, FeatureGate, StaticGate};
pub use history::{HistoryError, HistorySink, MemoryHistory};
pub use http::HttpResponse;
pub use registry::{MemoryRegistry, RegistryError, WatchRegistry};
pub use script::{CompiledScript, JinjaScriptEngine, ScriptEngine, ScriptError, ScriptKind};
pub use source::{DataSource, HttpDataSource, NoOpDataSource, Query, RoutedDataSource, SourceError};
pub use traced::{TracedChannel, TracedDataSource};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use channel::{ChannelCall, FakeChannel};
#[cfg(any(test, feature = "test-support"))]
pub use history::FakeHistory;
#[cfg(any(test, feature = "test-support"))]
pub use source::FakeDataSource;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature gating for watch execution
//!
//! Checked once per firing, before the pipeline runs. A denied firing is
//! still recorded in history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait FeatureGate: Clone + Send + Sync + 'static {
    fn is_enabled(&self) -> bool;

    /// Message recorded when the gate denies a firing
    fn denial_reason(&self) -> String {
        "watch execution is disabled".to_string()
    }
}

#[derive(Clone, Copy, Default)]
pub struct AlwaysAllow;

impl FeatureGate for AlwaysAllow {
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Toggleable gate, shared between clones
#[derive(Clone)]
pub struct StaticGate {
    enabled: Arc<AtomicBool>,
}

impl StaticGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl FeatureGate for StaticGate {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

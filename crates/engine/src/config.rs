// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wx_core::{ScheduleError, ScheduleZone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Watches allowed to execute at once; firings beyond this are rejected
    pub worker_pool_size: usize,
    /// Throttle for actions and watches that set none; `0s` disables it
    #[serde(with = "humantime_serde")]
    pub default_throttle_period: Duration,
    /// Grace period for in-flight executions on stop
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,
    /// How long manual requests wait for an in-flight execution
    #[serde(with = "humantime_serde")]
    pub manual_wait: Duration,
    #[serde(with = "humantime_serde")]
    pub input_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub action_timeout: Duration,
    /// IANA zone for cron schedules; system local when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 50,
            default_throttle_period: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(30),
            manual_wait: Duration::from_secs(10),
            input_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(30),
            timezone: None,
        }
    }
}

impl EngineConfig {
    pub fn zone(&self) -> Result<ScheduleZone, ScheduleError> {
        match &self.timezone {
            Some(name) => ScheduleZone::named(name),
            None => Ok(ScheduleZone::Local),
        }
    }
}

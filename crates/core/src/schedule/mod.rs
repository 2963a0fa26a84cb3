// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch schedules
//!
//! A schedule is either a fixed interval or a set of cron expressions. Cron
//! schedules are evaluated in a [`ScheduleZone`]; intervals are zone-free.

mod cron;

pub use cron::CronExpr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from parsing or evaluating a schedule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },
    #[error("cron expression '{0}' can never fire")]
    NeverFires(String),
    #[error("interval must be greater than zero")]
    ZeroInterval,
    #[error("schedule has no cron expressions")]
    Empty,
    #[error("invalid time of day '{0}' (expected HH:MM)")]
    InvalidTimeOfDay(String),
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("schedule has no fire time after {0}")]
    Exhausted(DateTime<Utc>),
}

/// Timezone a cron schedule is evaluated in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleZone {
    /// The host's local timezone
    #[default]
    Local,
    Named(Tz),
}

impl ScheduleZone {
    /// Resolve an IANA timezone name such as `Europe/Berlin`
    pub fn named(name: &str) -> Result<Self, ScheduleError> {
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
    }
}

/// A compiled schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleDef", into = "ScheduleDef")]
pub enum Schedule {
    Interval(Duration),
    Cron(Vec<CronExpr>),
}

impl Schedule {
    /// Next fire time strictly after `after`.
    ///
    /// For intervals `after` is the previous intended fire time (or the
    /// registration time for the first fire), so drift does not accumulate.
    pub fn next_fire_time(
        &self,
        after: DateTime<Utc>,
        zone: &ScheduleZone,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        match self {
            Schedule::Interval(period) => chrono::Duration::from_std(*period)
                .ok()
                .and_then(|period| after.checked_add_signed(period))
                .ok_or(ScheduleError::Exhausted(after)),
            Schedule::Cron(exprs) => exprs
                .iter()
                .filter_map(|expr| match zone {
                    ScheduleZone::Local => expr.next_after(after, &chrono::Local),
                    ScheduleZone::Named(tz) => expr.next_after(after, tz),
                })
                .min()
                .ok_or(ScheduleError::Exhausted(after)),
        }
    }

    /// Short human-readable form, used in logs
    pub fn describe(&self) -> String {
        match self {
            Schedule::Interval(period) => {
                format!("every {}", humantime::format_duration(*period))
            }
            Schedule::Cron(exprs) => {
                let sources: Vec<&str> = exprs.iter().map(CronExpr::source).collect();
                format!("cron [{}]", sources.join(", "))
            }
        }
    }
}

/// Serialized schedule forms accepted in watch definitions
///
/// ```toml
/// schedule = { interval = "10s" }
/// schedule = { cron = "0 9 * * MON-FRI" }
/// schedule = { cron = ["0 9 * * *", "30 17 * * *"] }
/// schedule = { hourly = { minute = [0, 30] } }
/// schedule = { daily = { at = ["09:00", "17:30"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleDef {
    Interval(#[serde(with = "humantime_serde")] Duration),
    Cron(OneOrMany<String>),
    Hourly { minute: Vec<u32> },
    Daily { at: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl TryFrom<ScheduleDef> for Schedule {
    type Error = ScheduleError;

    fn try_from(def: ScheduleDef) -> Result<Self, Self::Error> {
        let sources = match def {
            ScheduleDef::Interval(period) => {
                if period.is_zero() {
                    return Err(ScheduleError::ZeroInterval);
                }
                return Ok(Schedule::Interval(period));
            }
            ScheduleDef::Cron(exprs) => exprs.into_vec(),
            ScheduleDef::Hourly { minute } => {
                if minute.is_empty() {
                    return Err(ScheduleError::Empty);
                }
                let minutes: Vec<String> = minute.iter().map(u32::to_string).collect();
                vec![format!("{} * * * *", minutes.join(","))]
            }
            ScheduleDef::Daily { at } => at
                .iter()
                .map(|time| daily_expr(time))
                .collect::<Result<_, _>>()?,
        };

        if sources.is_empty() {
            return Err(ScheduleError::Empty);
        }
        let exprs = sources
            .iter()
            .map(|source| source.parse())
            .collect::<Result<Vec<CronExpr>, _>>()?;
        Ok(Schedule::Cron(exprs))
    }
}

impl From<Schedule> for ScheduleDef {
    fn from(schedule: Schedule) -> Self {
        match schedule {
            Schedule::Interval(period) => ScheduleDef::Interval(period),
            Schedule::Cron(mut exprs) if exprs.len() == 1 => {
                ScheduleDef::Cron(OneOrMany::One(exprs.remove(0).into()))
            }
            Schedule::Cron(exprs) => {
                ScheduleDef::Cron(OneOrMany::Many(exprs.into_iter().map(String::from).collect()))
            }
        }
    }
}

impl std::str::FromStr for Schedule {
    type Err = ScheduleError;

    /// Parse a single cron expression, or an interval such as `30s`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match humantime::parse_duration(s.trim()) {
            Ok(period) => Schedule::try_from(ScheduleDef::Interval(period)),
            Err(_) => Ok(Schedule::Cron(vec![s.parse()?])),
        }
    }
}

fn daily_expr(time: &str) -> Result<String, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeOfDay(time.to_string());
    let (hour, minute) = time.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(format!("{} {} * * *", minute, hour))
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Five-field cron expressions
//!
//! Fields are `minute hour day-of-month month day-of-week`. Each field accepts
//! `*`, single values, ranges (`a-b`), steps (`*/n`, `a-b/n`, `a/n`) and
//! comma-separated lists. Months and weekdays also accept three-letter names.
//! When both day-of-month and day-of-week are restricted a day matches if
//! either does. A day field written with a leading `*` (`*/2` included) is
//! ANDed with the other.

use super::ScheduleError;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Days scanned before giving up. Covers the eight-year gap between leap
/// days around non-leap century years.
const MAX_SEARCH_DAYS: u32 = 366 * 9;

/// Longest forward DST gap we probe across, in minutes.
const MAX_GAP_MINUTES: u32 = 24 * 60;

/// A parsed cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    source: String,
    minutes: u64,
    hours: u32,
    days: u32,
    months: u16,
    weekdays: u8,
    days_restricted: bool,
    weekdays_restricted: bool,
}

struct Field {
    bits: u64,
    restricted: bool,
}

impl CronExpr {
    /// The expression as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Next fire time strictly after `after`, evaluated in `tz`.
    ///
    /// A nominal time skipped by a forward DST transition resolves to the
    /// first representable instant after the gap. An ambiguous time during a
    /// backward transition fires once, at its earliest occurrence.
    pub fn next_after<Tz: TimeZone>(&self, after: DateTime<Utc>, tz: &Tz) -> Option<DateTime<Utc>> {
        let mut date = after.with_timezone(tz).naive_local().date();

        for _ in 0..MAX_SEARCH_DAYS {
            if self.day_matches(date) {
                for hour in bits(u64::from(self.hours), 24) {
                    for minute in bits(self.minutes, 60) {
                        let Some(naive) = date.and_hms_opt(hour, minute, 0) else {
                            continue;
                        };
                        if let Some(candidate) = resolve_local(tz, naive) {
                            if candidate > after {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        if self.months & (1 << date.month()) == 0 {
            return false;
        }
        let day_hit = self.days & (1 << date.day()) != 0;
        let weekday_hit = self.weekdays & (1 << date.weekday().num_days_from_sunday()) != 0;
        // A field starting with `*` (including `*/n`) joins with AND
        if self.days_restricted && self.weekdays_restricted {
            day_hit || weekday_hit
        } else {
            day_hit && weekday_hit
        }
    }

    /// Reject day-of-month/month combinations that can never occur (e.g. Feb 30)
    fn check_feasible(&self) -> Result<(), ScheduleError> {
        if self.days_restricted && self.weekdays_restricted {
            return Ok(());
        }
        let feasible = (1..=12u32)
            .filter(|m| self.months & (1 << m) != 0)
            .any(|m| (1..=max_days_in_month(m)).any(|d| self.days & (1 << d) != 0));
        if feasible {
            Ok(())
        } else {
            Err(ScheduleError::NeverFires(self.source.clone()))
        }
    }
}

impl FromStr for CronExpr {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let source = s.trim().to_string();
        let invalid = |reason: String| ScheduleError::InvalidCron {
            expr: source.clone(),
            reason,
        };

        let fields: Vec<&str> = source.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        }

        let minutes = parse_field(fields[0], 0, 59, &[]).map_err(&invalid)?;
        let hours = parse_field(fields[1], 0, 23, &[]).map_err(&invalid)?;
        let days = parse_field(fields[2], 1, 31, &[]).map_err(&invalid)?;
        let months = parse_field(fields[3], 1, 12, &MONTH_NAMES).map_err(&invalid)?;
        let weekdays = parse_field(fields[4], 0, 7, &WEEKDAY_NAMES).map_err(&invalid)?;

        // 7 is an alias for Sunday
        let mut weekday_bits = weekdays.bits;
        if weekday_bits & (1 << 7) != 0 {
            weekday_bits = (weekday_bits & !(1 << 7)) | 1;
        }

        let expr = CronExpr {
            source: source.clone(),
            minutes: minutes.bits,
            hours: hours.bits as u32,
            days: days.bits as u32,
            months: months.bits as u16,
            weekdays: weekday_bits as u8,
            days_restricted: days.restricted,
            weekdays_restricted: weekdays.restricted,
        };
        expr.check_feasible()?;
        Ok(expr)
    }
}

impl TryFrom<String> for CronExpr {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CronExpr> for String {
    fn from(expr: CronExpr) -> Self {
        expr.source
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn parse_field(text: &str, min: u32, max: u32, names: &[&str]) -> Result<Field, String> {
    let mut bits = 0u64;
    for part in text.split(',') {
        if part.is_empty() {
            return Err(format!("empty list element in '{}'", text));
        }
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{}'", step))?;
                if step == 0 {
                    return Err("step must be greater than zero".to_string());
                }
                (base, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if base == "*" {
            (min, max)
        } else if let Some((lo, hi)) = base.split_once('-') {
            (parse_value(lo, min, names)?, parse_value(hi, min, names)?)
        } else {
            let value = parse_value(base, min, names)?;
            // `a/n` runs from a to the end of the range
            (value, if step.is_some() { max } else { value })
        };

        if lo < min || hi > max {
            return Err(format!("'{}' is outside {}-{}", part, min, max));
        }
        if lo > hi {
            return Err(format!("range '{}' is reversed", part));
        }

        let step = step.unwrap_or(1) as usize;
        for value in (lo..=hi).step_by(step) {
            bits |= 1 << value;
        }
    }

    Ok(Field {
        bits,
        restricted: !text.starts_with('*'),
    })
}

fn parse_value(text: &str, min: u32, names: &[&str]) -> Result<u32, String> {
    if let Ok(value) = text.parse::<u32>() {
        return Ok(value);
    }
    names
        .iter()
        .position(|name| name.eq_ignore_ascii_case(text))
        .map(|index| index as u32 + min)
        .ok_or_else(|| format!("invalid value '{}'", text))
}

fn max_days_in_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Iterate the set bit positions below `limit`, ascending
fn bits(set: u64, limit: u32) -> impl Iterator<Item = u32> {
    (0..limit).filter(move |i| set & (1 << i) != 0)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..MAX_GAP_MINUTES {
                probe += Duration::minutes(1);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
                    LocalResult::Ambiguous(earliest, _) => {
                        return Some(earliest.with_timezone(&Utc))
                    }
                    LocalResult::None => continue,
                }
            }
            None
        }
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Timelike};
use chrono_tz::Tz;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn cron(expr: &str) -> CronExpr {
    expr.parse().unwrap()
}

#[test]
fn every_minute_fires_on_next_minute_boundary() {
    let next = cron("* * * * *").next_after(utc(2026, 4, 1, 10, 0, 30), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 1, 10, 1, 0)));
}

#[test]
fn next_is_strictly_after_a_matching_instant() {
    let expr = cron("0 10 * * *");
    let next = expr.next_after(utc(2026, 4, 1, 10, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 2, 10, 0, 0)));
}

#[test]
fn lists_ranges_and_steps_combine() {
    let expr = cron("5,20-30/5 */6 * * *");
    let mut at = utc(2026, 4, 1, 0, 0, 0);
    let mut fired = Vec::new();
    for _ in 0..5 {
        at = expr.next_after(at, &Utc).unwrap();
        fired.push((at.hour(), at.minute()));
    }
    assert_eq!(fired, vec![(0, 5), (0, 20), (0, 25), (0, 30), (6, 5)]);
}

#[test]
fn weekday_names_skip_the_weekend() {
    // 2026-04-03 is a Friday
    let next = cron("0 9 * * MON-FRI").next_after(utc(2026, 4, 3, 10, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 6, 9, 0, 0)));
}

#[test]
fn month_names_are_case_insensitive() {
    let next = cron("0 0 1 jul *").next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 7, 1, 0, 0, 0)));
}

#[test]
fn seven_is_sunday() {
    // 2026-04-01 is a Wednesday
    let next = cron("0 0 * * 7").next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 5, 0, 0, 0)));
}

#[test]
fn restricted_day_of_month_and_weekday_match_either() {
    // Friday the 3rd comes before the 13th
    let next = cron("0 0 13 * FRI").next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 3, 0, 0, 0)));
}

#[test]
fn stepped_day_of_month_skips_days() {
    let expr = cron("0 0 */2 * *");
    let next = expr.next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 3, 0, 0, 0)));

    // April has 30 days; the 31st is not in the set either way
    let next = expr.next_after(utc(2026, 4, 29, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 5, 1, 0, 0, 0)));
}

#[test]
fn stepped_weekday_is_not_ignored() {
    // */2 weekdays are SUN, TUE, THU, SAT; 2026-04-01 is a Wednesday
    let next = cron("0 0 * * */2").next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 2, 0, 0, 0)));
}

#[test]
fn stepped_weekday_narrows_a_restricted_day_of_month() {
    // Day 1-10 AND weekday in SUN, TUE, THU, SAT: Thursday the 2nd
    let next = cron("0 0 1-10 * */2").next_after(utc(2026, 4, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 2, 0, 0, 0)));
    // After Saturday the 4th comes Sunday the 5th
    let next = cron("0 0 1-10 * */2").next_after(utc(2026, 4, 4, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 4, 5, 0, 0, 0)));
    // Past the 10th, wait for May: 2026-05-02 is a Saturday
    let next = cron("0 0 1-10 * */2").next_after(utc(2026, 4, 10, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2026, 5, 2, 0, 0, 0)));
}

#[test]
fn leap_day_waits_for_a_leap_year() {
    let next = cron("0 0 29 2 *").next_after(utc(2026, 3, 1, 0, 0, 0), &Utc);
    assert_eq!(next, Some(utc(2028, 2, 29, 0, 0, 0)));
}

#[test]
fn named_zone_offsets_fire_time() {
    let berlin: Tz = "Europe/Berlin".parse().unwrap();
    let next = cron("0 9 * * *").next_after(utc(2026, 1, 15, 0, 0, 0), &berlin);
    assert_eq!(next, Some(utc(2026, 1, 15, 8, 0, 0)));
}

#[test]
fn time_skipped_by_spring_forward_fires_after_the_gap() {
    // 2026-03-08 02:00 EST jumps to 03:00 EDT in New York
    let ny: Tz = "America/New_York".parse().unwrap();
    let expr = cron("30 2 * * *");

    let first = expr.next_after(utc(2026, 3, 8, 5, 0, 0), &ny).unwrap();
    assert_eq!(first, utc(2026, 3, 8, 7, 0, 0));

    let second = expr.next_after(first, &ny).unwrap();
    assert_eq!(second, utc(2026, 3, 9, 6, 30, 0));
}

#[test]
fn ambiguous_time_on_fall_back_fires_once() {
    // 2026-11-01 01:00-02:00 occurs twice in New York
    let ny: Tz = "America/New_York".parse().unwrap();
    let expr = cron("30 1 * * *");

    let first = expr.next_after(utc(2026, 11, 1, 4, 0, 0), &ny).unwrap();
    assert_eq!(first, utc(2026, 11, 1, 5, 30, 0));

    let second = expr.next_after(first, &ny).unwrap();
    assert_eq!(second, utc(2026, 11, 2, 6, 30, 0));
}

#[test]
fn display_keeps_source_text() {
    assert_eq!(cron("  0 9 * * MON  ").to_string(), "0 9 * * MON");
}

use yare::parameterized;

#[parameterized(
    too_few_fields = { "* * * *" },
    too_many_fields = { "* * * * * *" },
    minute_out_of_range = { "60 * * * *" },
    hour_out_of_range = { "0 24 * * *" },
    day_zero = { "0 0 0 * *" },
    weekday_out_of_range = { "0 0 * * 8" },
    zero_step = { "*/0 * * * *" },
    reversed_range = { "30-10 * * * *" },
    unknown_name = { "0 0 * * FUNDAY" },
    empty_list_element = { "1,,2 * * * *" },
)]
fn malformed_expressions_are_rejected(expr: &str) {
    let err = expr.parse::<CronExpr>().unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidCron { .. }), "{err}");
}

#[parameterized(
    february_thirtieth = { "0 0 30 2 *" },
    february_thirty_first = { "0 0 31 2 *" },
    april_and_june_thirty_first = { "0 0 31 4,6 *" },
)]
fn impossible_dates_are_rejected_at_parse_time(expr: &str) {
    assert_eq!(
        expr.parse::<CronExpr>(),
        Err(ScheduleError::NeverFires(expr.to_string()))
    );
}

#[test]
fn impossible_day_with_weekday_is_still_feasible() {
    // Either field may match, so Fridays in February still fire
    assert!("0 0 30 2 FRI".parse::<CronExpr>().is_ok());
}

use proptest::prelude::*;

proptest! {
    #[test]
    fn next_fire_is_after_and_on_a_matching_minute(
        minute in 0u32..60,
        hour in 0u32..24,
        offset_secs in 0i64..(4 * 365 * 24 * 3600),
    ) {
        let expr: CronExpr = format!("{} {} * * *", minute, hour).parse().unwrap();
        let after = utc(2026, 1, 1, 0, 0, 0) + chrono::Duration::seconds(offset_secs);

        let next = expr.next_after(after, &Utc).unwrap();

        prop_assert!(next > after);
        prop_assert!(next - after <= chrono::Duration::days(1));
        prop_assert_eq!((next.hour(), next.minute(), next.second()), (hour, minute, 0));
    }

    #[test]
    fn successive_fires_strictly_increase(
        step in 1u32..30,
        offset_secs in 0i64..(365 * 24 * 3600),
    ) {
        let expr: CronExpr = format!("*/{} * * * *", step).parse().unwrap();
        let mut at = utc(2026, 1, 1, 0, 0, 0) + chrono::Duration::seconds(offset_secs);
        for _ in 0..10 {
            let next = expr.next_after(at, &Utc).unwrap();
            prop_assert!(next > at);
            prop_assert_eq!(next.minute() % step, 0);
            at = next;
        }
    }
}

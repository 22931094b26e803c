//! Expansion of a task's cycle definition into concrete occurrence dates.
//!
//! Weekdays are numbered `0` (Monday) through `6` (Sunday).

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::models::CycleType;

/// Occurrences generated for a daily cycle without an end date.
pub const DAILY_DEFAULT_DAYS: i64 = 30;

/// Weeks generated for a weekly cycle without an end date.
pub const WEEKLY_DEFAULT_WEEKS: i64 = 12;

/// The recurrence parameters of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    pub cycle_type: CycleType,
    /// Comma-separated weekday selectors; only read for weekly cycles.
    pub week_days: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Parses a comma-separated weekday list such as `"0,2,4"`.
///
/// Tokens that are not integers in `0..=6` are dropped silently.
pub fn parse_week_days(week_days: &str) -> BTreeSet<u8> {
    week_days
        .split(',')
        .filter_map(|token| token.trim().parse::<u8>().ok())
        .filter(|day| *day <= 6)
        .collect()
}

/// Expands `cycle` into its ordered list of planned occurrences.
///
/// Expansion never fails: occurrences past the largest representable date are
/// not generated. `now` is only used by `once` cycles, whose single occurrence is stamped
/// with the expansion time rather than the plan start date.
pub fn expand(cycle: &Cycle, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    match cycle.cycle_type {
        CycleType::Once => vec![now],
        CycleType::Daily => expand_daily(cycle.start, cycle.end),
        CycleType::Weekly => {
            let days = cycle.week_days.as_deref().map(parse_week_days).unwrap_or_default();
            expand_weekly(&days, cycle.start, cycle.end)
        }
    }
}

fn in_range(date: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    match end {
        Some(end) => date.date_naive() <= end.date_naive(),
        None => true,
    }
}

fn expand_daily(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Vec<DateTime<Utc>> {
    let mut dates = Vec::new();
    let mut current = start;
    while in_range(current, end) {
        dates.push(current);
        if end.is_none() && dates.len() as i64 >= DAILY_DEFAULT_DAYS {
            break;
        }
        // Stop at the last representable date.
        match current.checked_add_signed(Duration::days(1)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

fn expand_weekly(days: &BTreeSet<u8>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Vec<DateTime<Utc>> {
    if days.is_empty() {
        return Vec::new();
    }

    // Offset of each selected weekday from the start date, in 0..7.
    let start_weekday = i64::from(start.weekday().num_days_from_monday());
    let mut offsets: Vec<i64> = days
        .iter()
        .map(|day| (i64::from(*day) - start_weekday).rem_euclid(7))
        .collect();
    offsets.sort_unstable();

    let mut dates = Vec::new();
    let mut week = 0;
    loop {
        let before = dates.len();
        for offset in &offsets {
            // Offsets are ascending, so every later one would overflow too.
            let Some(date) = start.checked_add_signed(Duration::days(offset + week * 7)) else {
                return dates;
            };
            if in_range(date, end) {
                dates.push(date);
            }
        }
        week += 1;

        match end {
            None if week >= WEEKLY_DEFAULT_WEEKS => break,
            // A week without any occurrence ends the expansion.
            Some(_) if dates.len() == before => break,
            _ => {}
        }
    }
    dates
}

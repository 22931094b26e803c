use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc, Weekday};
use practask::models::CycleType;
use practask::recurrence::{expand, parse_week_days, Cycle, DAILY_DEFAULT_DAYS, WEEKLY_DEFAULT_WEEKS};

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn cycle(cycle_type: CycleType, week_days: Option<&str>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Cycle {
    Cycle { cycle_type, week_days: week_days.map(String::from), start, end }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap()
}

// 2025-03-03 is a Monday.
const MONDAY: (i32, u32, u32) = (2025, 3, 3);

fn monday() -> DateTime<Utc> {
    date(MONDAY.0, MONDAY.1, MONDAY.2)
}

#[test]
fn test_daily_without_end_yields_thirty_consecutive_days() {
    let start = date(2025, 1, 15);
    let dates = expand(&cycle(CycleType::Daily, None, start, None), now());

    assert_eq!(dates.len(), DAILY_DEFAULT_DAYS as usize);
    assert_eq!(dates[0], start);
    for (i, d) in dates.iter().enumerate() {
        assert_eq!(*d, start + Duration::days(i as i64));
    }
    assert_eq!(*dates.last().unwrap(), start + Duration::days(29));
}

#[test]
fn test_daily_end_equals_start_yields_one() {
    let start = date(2025, 1, 15);
    let dates = expand(&cycle(CycleType::Daily, None, start, Some(start)), now());
    assert_eq!(dates, vec![start]);
}

#[test]
fn test_daily_end_is_inclusive_calendar_day() {
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 18, 0, 0).unwrap();
    // End earlier in the day than the start time still includes that calendar day.
    let end = Utc.with_ymd_and_hms(2025, 1, 17, 6, 0, 0).unwrap();
    let dates = expand(&cycle(CycleType::Daily, None, start, Some(end)), now());

    assert_eq!(dates.len(), 3);
    assert_eq!(dates[2], Utc.with_ymd_and_hms(2025, 1, 17, 18, 0, 0).unwrap());
}

#[test]
fn test_daily_across_leap_day() {
    let dates = expand(&cycle(CycleType::Daily, None, date(2024, 2, 27), Some(date(2024, 3, 2))), now());
    let days: Vec<u32> = dates.iter().map(|d| d.day()).collect();
    assert_eq!(days, vec![27, 28, 29, 1, 2]);
}

#[test]
fn test_daily_end_before_start_yields_nothing() {
    let dates = expand(&cycle(CycleType::Daily, None, date(2025, 1, 15), Some(date(2025, 1, 14))), now());
    assert!(dates.is_empty());
}

#[test]
fn test_weekly_end_before_start_yields_nothing() {
    let end = monday() - Duration::days(1);
    let dates = expand(&cycle(CycleType::Weekly, Some("0,2,4"), monday(), Some(end)), now());
    assert!(dates.is_empty());

    // Every weekday selected still stops after the empty first week.
    let dates = expand(&cycle(CycleType::Weekly, Some("0,1,2,3,4,5,6"), monday(), Some(end)), now());
    assert!(dates.is_empty());
}

/// Midnight `days_before` days ahead of the last date chrono can represent.
fn near_max(days_before: u64) -> DateTime<Utc> {
    NaiveDate::MAX
        .checked_sub_days(Days::new(days_before))
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

#[test]
fn test_daily_stops_at_last_representable_date() {
    let dates = expand(&cycle(CycleType::Daily, None, near_max(5), None), now());
    assert_eq!(dates.len(), 6);
    assert_eq!(dates.last().unwrap().date_naive(), NaiveDate::MAX);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));

    let far_end = Some(near_max(0));
    let dates = expand(&cycle(CycleType::Daily, None, near_max(2), far_end), now());
    assert_eq!(dates.len(), 3);
}

#[test]
fn test_weekly_stops_at_last_representable_date() {
    let dates = expand(&cycle(CycleType::Weekly, Some("0,1,2,3,4,5,6"), near_max(10), None), now());
    assert_eq!(dates.len(), 11);
    assert_eq!(dates.last().unwrap().date_naive(), NaiveDate::MAX);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));

    let dates = expand(&cycle(CycleType::Weekly, Some("0,6"), near_max(3), Some(near_max(0))), now());
    assert!(dates.len() <= 2);
    assert!(dates.iter().all(|d| d.date_naive() <= NaiveDate::MAX));
}

#[test]
fn test_weekly_mon_wed_fri_without_end() {
    let dates = expand(&cycle(CycleType::Weekly, Some("0,2,4"), monday(), None), now());

    assert_eq!(dates.len(), (WEEKLY_DEFAULT_WEEKS * 3) as usize);
    assert_eq!(dates.len(), 36);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    for d in &dates {
        assert!(matches!(d.weekday(), Weekday::Mon | Weekday::Wed | Weekday::Fri));
    }
    assert_eq!(dates[0], monday());
    assert_eq!(*dates.last().unwrap(), monday() + Duration::days(11 * 7 + 4));
}

#[test]
fn test_weekly_includes_start_when_it_is_selected() {
    // Wednesday start, Wednesday selected.
    let start = date(2025, 3, 5);
    let dates = expand(&cycle(CycleType::Weekly, Some("2"), start, None), now());
    assert_eq!(dates[0], start);
    assert_eq!(dates.len(), 12);
}

#[test]
fn test_weekly_days_before_start_weekday_roll_to_next_week() {
    // Wednesday start: Friday comes first, then the following Monday.
    let start = date(2025, 3, 5);
    let dates = expand(&cycle(CycleType::Weekly, Some("0,4"), start, None), now());

    assert_eq!(dates[0], date(2025, 3, 7));
    assert_eq!(dates[1], date(2025, 3, 10));
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    assert!(dates.iter().all(|d| *d >= start));
}

#[test]
fn test_weekly_with_end_date() {
    let dates = expand(&cycle(CycleType::Weekly, Some("0,2,4"), monday(), Some(date(2025, 3, 12))), now());
    assert_eq!(
        dates,
        vec![date(2025, 3, 3), date(2025, 3, 5), date(2025, 3, 7), date(2025, 3, 10), date(2025, 3, 12)]
    );
}

#[test]
fn test_weekly_with_far_end_is_not_capped() {
    let end = monday() + Duration::weeks(20);
    let dates = expand(&cycle(CycleType::Weekly, Some("0"), monday(), Some(end)), now());
    assert_eq!(dates.len(), 21);
}

#[test]
fn test_weekly_empty_or_non_numeric_yields_nothing() {
    for days in ["", "a,b", " , ", "mon,tue", "7,8,99"] {
        let dates = expand(&cycle(CycleType::Weekly, Some(days), monday(), None), now());
        assert!(dates.is_empty(), "week_days {:?} should expand to nothing", days);
    }
    assert!(expand(&cycle(CycleType::Weekly, None, monday(), None), now()).is_empty());
}

#[test]
fn test_weekly_ignores_invalid_tokens_and_duplicates() {
    let dates = expand(&cycle(CycleType::Weekly, Some("1, x,1,9,1"), monday(), None), now());
    assert_eq!(dates.len(), 12);
    assert!(dates.iter().all(|d| d.weekday() == Weekday::Tue));
}

#[test]
fn test_once_yields_single_occurrence_at_expansion_time() {
    let with_end = expand(&cycle(CycleType::Once, None, monday(), Some(monday() + Duration::days(10))), now());
    let without_end = expand(&cycle(CycleType::Once, None, monday(), None), now());
    assert_eq!(with_end, vec![now()]);
    assert_eq!(without_end, vec![now()]);
}

#[test]
fn test_expansion_is_deterministic() {
    let c = cycle(CycleType::Weekly, Some("6,3"), date(2024, 12, 30), Some(date(2025, 2, 1)));
    assert_eq!(expand(&c, now()), expand(&c, now()));
    let d = cycle(CycleType::Daily, None, date(2024, 12, 30), None);
    assert_eq!(expand(&d, now()), expand(&d, now()));
}

#[test]
fn test_parse_week_days() {
    let days: Vec<u8> = parse_week_days(" 4,0 ,2,two,2,-1,6").into_iter().collect();
    assert_eq!(days, vec![0, 2, 4, 6]);
    assert!(parse_week_days("").is_empty());
}

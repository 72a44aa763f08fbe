//! Growth engine: contiguous weekly series and week-over-week change.

use chrono::NaiveDate;
use funnel_core::{
    calendar::parse_timestamp,
    error::MetricsError,
    growth_engine::{compute_weekly_growth, GrowthMetric},
    snapshot::Event,
    types::Timestamp,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ts(s: &str) -> Timestamp {
    parse_timestamp(s).unwrap()
}

fn ev(user_id: i64, event_type: &str, date: &str) -> Event {
    Event { user_id, event_type: event_type.into(), event_date: ts(date) }
}

fn monday(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

/// Five signups in the week of 2025-01-06, none the next week, three the week after.
fn gap_fixture() -> Vec<Event> {
    let mut events: Vec<Event> = (1..=5).map(|u| ev(u, "signup", "2025-01-07")).collect();
    events.extend((6..=8).map(|u| ev(u, "signup", "2025-01-22")));
    events.push(ev(1, "visit", "2025-01-14"));
    events
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// A week with no matching events is filled with 0 and reads -100%.
#[test]
fn gap_week_reads_minus_one_hundred() {
    let series = compute_weekly_growth(
        &gap_fixture(),
        &GrowthMetric::event_type("signup"),
        12,
        ts("2025-02-01"),
    );

    let rows: Vec<(NaiveDate, u64, f64)> = series
        .points
        .iter()
        .map(|p| (p.week_start, p.value, p.pct_change))
        .collect();
    assert_eq!(
        rows,
        vec![
            (monday(1, 6), 5, 0.0),
            (monday(1, 13), 0, -100.0),
            (monday(1, 20), 3, 100.0),
        ]
    );
}

/// The series covers every week from first to last, with no duplicates.
#[test]
fn series_is_contiguous() {
    let events = vec![
        ev(1, "signup", "2025-01-01"),
        ev(2, "signup", "2025-01-01"),
        ev(3, "signup", "2025-03-03"),
    ];
    let series = compute_weekly_growth(&events, &GrowthMetric::event_type("signup"), 52, ts("2025-04-01"));

    let first = series.points.first().unwrap().week_start;
    let last = series.points.last().unwrap().week_start;
    let expected = ((last - first).num_days() / 7 + 1) as usize;
    assert_eq!(series.len(), expected);
    assert!(series
        .points
        .windows(2)
        .all(|w| (w[1].week_start - w[0].week_start).num_days() == 7));
}

/// Regular week-over-week change, rounded.
#[test]
fn pct_change_between_non_zero_weeks() {
    let mut events: Vec<Event> = (1..=3).map(|u| ev(u, "visit", "2025-01-07")).collect();
    events.extend((1..=4).map(|u| ev(u, "visit", "2025-01-14")));
    let series = compute_weekly_growth(&events, &GrowthMetric::ActiveUsers, 12, ts("2025-02-01"));
    assert_eq!(series.points[1].pct_change, 33.33);
}

/// Events outside [now - window, now] are ignored.
#[test]
fn window_limits_counted_events() {
    let events = vec![
        ev(1, "signup", "2024-06-03"),
        ev(2, "signup", "2025-01-07"),
        ev(3, "signup", "2025-03-01"),
    ];
    let series = compute_weekly_growth(&events, &GrowthMetric::event_type("signup"), 4, ts("2025-01-20"));
    assert_eq!(series.len(), 1);
    assert_eq!(series.points[0].week_start, monday(1, 6));
    assert_eq!(series.points[0].value, 1);
}

/// ActiveUsers counts any event; EventType only its own.
#[test]
fn metric_selects_events() {
    let events = gap_fixture();
    let active = compute_weekly_growth(&events, &GrowthMetric::ActiveUsers, 12, ts("2025-02-01"));
    assert_eq!(active.points[1].value, 1, "the visit fills week two");

    let none = compute_weekly_growth(&events, &GrowthMetric::event_type("paid"), 12, ts("2025-02-01"));
    assert!(none.is_empty());
}

/// Dashboard names resolve; anything else fails fast.
#[test]
fn parse_metric_names() {
    assert_eq!("active_users".parse::<GrowthMetric>().unwrap(), GrowthMetric::ActiveUsers);
    assert_eq!("signups".parse::<GrowthMetric>().unwrap(), GrowthMetric::event_type("signup"));
    assert_eq!("event:demo".parse::<GrowthMetric>().unwrap(), GrowthMetric::event_type("demo"));
    assert_eq!(GrowthMetric::event_type("trial").to_string(), "event:trial");

    for bad in ["revenue", "event:", ""] {
        assert!(
            matches!(bad.parse::<GrowthMetric>(), Err(MetricsError::InvalidArgument { .. })),
            "'{bad}' should be rejected"
        );
    }
}

/// A window longer than the calendar covers all history instead of overflowing.
#[test]
fn oversized_window_counts_all_history() {
    let events = vec![ev(1, "visit", "1999-12-28"), ev(2, "visit", "2025-01-07")];
    let series = compute_weekly_growth(&events, &GrowthMetric::ActiveUsers, u32::MAX, ts("2025-02-01"));
    assert_eq!(series.points.first().unwrap().week_start, NaiveDate::from_ymd_opt(1999, 12, 27).unwrap());
    assert_eq!(series.points.last().unwrap().week_start, monday(1, 6));
    assert_eq!(series.points.iter().map(|p| p.value).sum::<u64>(), 2);
}

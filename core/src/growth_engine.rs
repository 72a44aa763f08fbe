//! Growth engine — weekly distinct-user series with week-over-week change.
//!
//! Only events inside `[now - window_weeks, now]` are counted; a window
//! longer than the calendar covers all history. Weeks
//! between the first and last observed week that saw no matching event
//! are filled with 0, and the percentage change is computed on the
//! filled series, so a gap reads -100% and the week after it a rebound.

use crate::{
    calendar::{days_before, week_start},
    error::{MetricsError, MetricsResult},
    snapshot::Event,
    table::{distinct_counts, group_distinct, round2},
    types::Timestamp,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a weekly value counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrowthMetric {
    /// Distinct users with any event.
    ActiveUsers,
    /// Distinct users with an event of this type.
    EventType(String),
}

impl GrowthMetric {
    pub fn event_type(event_type: impl Into<String>) -> Self {
        Self::EventType(event_type.into())
    }

    fn matches(&self, event: &Event) -> bool {
        match self {
            Self::ActiveUsers => true,
            Self::EventType(t) => event.event_type == *t,
        }
    }
}

impl FromStr for GrowthMetric {
    type Err = MetricsError;

    /// Accepts the dashboard metric names plus `event:<type>` for any
    /// other configured stage.
    fn from_str(s: &str) -> MetricsResult<Self> {
        let s = s.trim();
        match s {
            "active_users" => Ok(Self::ActiveUsers),
            "signups"      => Ok(Self::event_type("signup")),
            "visits"       => Ok(Self::event_type("visit")),
            "trials"       => Ok(Self::event_type("trial")),
            "paid"         => Ok(Self::event_type("paid")),
            _ => match s.strip_prefix("event:") {
                Some(t) if !t.is_empty() => Ok(Self::event_type(t)),
                _ => Err(MetricsError::InvalidArgument {
                    name:     "growth metric",
                    value:    s.to_string(),
                    expected: "active_users, signups, visits, trials, paid, event:<type>".into(),
                }),
            },
        }
    }
}

impl fmt::Display for GrowthMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveUsers => write!(f, "active_users"),
            Self::EventType(t) => write!(f, "event:{t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub week_start: NaiveDate,
    pub value:      u64,
    pub pct_change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGrowthSeries {
    pub points: Vec<GrowthPoint>,
}

impl WeeklyGrowthSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn compute_weekly_growth(
    events: &[Event],
    metric: &GrowthMetric,
    window_weeks: u32,
    now: Timestamp,
) -> WeeklyGrowthSeries {
    let window_start = days_before(now, window_weeks as u64 * 7);

    let weekly = distinct_counts(group_distinct(events, |e| {
        let in_window = e.event_date >= window_start && e.event_date <= now;
        (in_window && metric.matches(e)).then(|| (week_start(e.event_date), e.user_id))
    }));

    let (Some(&first), Some(&last)) = (weekly.keys().next(), weekly.keys().next_back()) else {
        return WeeklyGrowthSeries::default();
    };

    let mut points = Vec::new();
    let mut prev: Option<u64> = None;
    let mut week = first;
    while week <= last {
        let value = weekly.get(&week).copied().unwrap_or(0) as u64;
        points.push(GrowthPoint {
            week_start: week,
            value,
            pct_change: pct_change(prev, value),
        });
        prev = Some(value);
        week += Duration::days(7);
    }

    log::debug!("growth: {metric} -> {} weeks", points.len());
    WeeklyGrowthSeries { points }
}

/// 0 for the first point; from a zero week, 0 if still zero else 100.
fn pct_change(prev: Option<u64>, value: u64) -> f64 {
    match prev {
        None => 0.0,
        Some(0) if value == 0 => 0.0,
        Some(0) => 100.0,
        Some(p) => round2((value as f64 - p as f64) / p as f64 * 100.0),
    }
}

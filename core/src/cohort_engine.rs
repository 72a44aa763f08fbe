//! Cohort engine — signup cohorts and a weekly retention matrix.
//!
//! Users are grouped by the week or month containing their signup.
//! Every event is aligned to whole 7-day periods since its user's
//! signup; the period width is 7 days for monthly cohorts too.
//! Events before signup and events of unknown users are ignored.
//!
//! Column 0 of every row is the cohort size (all users who signed up in
//! that cohort) and reads 100% by construction. Every later column is
//! the distinct active users in that period over the cohort size.

use crate::{
    calendar::{month_start, week_start, weeks_between},
    error::{MetricsError, MetricsResult},
    snapshot::{Event, User},
    table::{distinct_counts, group_distinct, index_by, round2, Pivot},
    types::Timestamp,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortBucket {
    #[default]
    Week,
    Month,
}

impl CohortBucket {
    pub fn cohort_start(self, signup: Timestamp) -> NaiveDate {
        match self {
            Self::Week  => week_start(signup),
            Self::Month => month_start(signup),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week  => "week",
            Self::Month => "month",
        }
    }
}

impl FromStr for CohortBucket {
    type Err = MetricsError;

    fn from_str(s: &str) -> MetricsResult<Self> {
        match s.trim() {
            "week"  => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(MetricsError::InvalidArgument {
                name:     "cohort bucket",
                value:    other.to_string(),
                expected: "week, month".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    pub cohort_start:  NaiveDate,
    pub cohort_size:   u64,
    /// Distinct users per period column; index 0 holds the cohort size.
    pub active_users:  Vec<u64>,
    pub retention_pct: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMatrix {
    pub bucket:  CohortBucket,
    /// Relative week indexes, ascending. Always starts at 0 when non-empty.
    pub periods: Vec<i64>,
    pub rows:    Vec<CohortRow>,
}

impl CohortMatrix {
    pub fn empty(bucket: CohortBucket) -> Self {
        Self { bucket, periods: Vec::new(), rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn retention(&self, cohort_start: NaiveDate, period: i64) -> Option<f64> {
        let col = self.periods.iter().position(|&p| p == period)?;
        self.rows
            .iter()
            .find(|r| r.cohort_start == cohort_start)
            .map(|r| r.retention_pct[col])
    }
}

pub fn compute_cohort_retention(
    users: &[User],
    events: &[Event],
    bucket: CohortBucket,
) -> CohortMatrix {
    let user_by_id = index_by(users, |u| u.user_id);

    let cohort_sizes = distinct_counts(group_distinct(users, |u| {
        Some((bucket.cohort_start(u.signup_date), u.user_id))
    }));

    let active = distinct_counts(group_distinct(events, |e| {
        let user = user_by_id.get(&e.user_id)?;
        let period = weeks_between(user.signup_date, e.event_date);
        (period >= 0).then(|| ((bucket.cohort_start(user.signup_date), period), e.user_id))
    }));

    if active.is_empty() {
        log::warn!("cohort: no events joined to any user; returning empty matrix");
        return CohortMatrix::empty(bucket);
    }

    let pivot = Pivot::from_cells(&active, [0]);

    let rows = pivot
        .rows
        .iter()
        .zip(&pivot.values)
        .map(|(&cohort_start, counts)| {
            // A pivot row exists only if some user of the cohort joined.
            let size = cohort_sizes.get(&cohort_start).copied().unwrap_or(0).max(1);
            let active_users: Vec<u64> = pivot
                .columns
                .iter()
                .zip(counts)
                .map(|(&period, &count)| if period == 0 { size as u64 } else { count as u64 })
                .collect();
            let retention_pct = active_users
                .iter()
                .map(|&count| round2(count as f64 / size as f64 * 100.0))
                .collect();
            CohortRow {
                cohort_start,
                cohort_size: size as u64,
                active_users,
                retention_pct,
            }
        })
        .collect();

    log::debug!(
        "cohort: {} cohorts x {} periods ({})",
        pivot.rows.len(),
        pivot.columns.len(),
        bucket.as_str()
    );

    CohortMatrix { bucket, periods: pivot.columns, rows }
}

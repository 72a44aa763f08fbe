//! Display filter — post-computation trimming for presentation.
//!
//! Applied to a finished bundle, never inside an engine: the lookback
//! only hides growth weeks, and the allowlist only hides funnel rows.
//! Percentages already computed are left untouched.

use crate::{calendar::days_before, runner::MetricsBundle, types::Timestamp};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayFilter {
    pub lookback_days: u32,
    pub event_types:   Vec<String>,
}

impl DisplayFilter {
    pub fn apply(&self, mut bundle: MetricsBundle, now: Timestamp) -> MetricsBundle {
        let cutoff = days_before(now, self.lookback_days as u64);

        bundle
            .funnel
            .rows
            .retain(|row| self.event_types.iter().any(|t| *t == row.stage));
        bundle
            .weekly_growth
            .points
            .retain(|point| point.week_start.and_time(NaiveTime::MIN) >= cutoff);
        bundle
    }
}

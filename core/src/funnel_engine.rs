//! Funnel engine — ordered per-stage user counts and conversion ratios.
//!
//! Each stage counts distinct users with at least one event of that
//! type. Stages are not required to be nested; the engine only reports.
//! Percentage rules:
//!   - from start:  count[i] / max(count[0], 1) * 100
//!   - from prev:   100 for the first stage and for any 0 -> x transition
//!   - drop-off:    100 - from prev

use crate::{
    snapshot::Event,
    table::{distinct_counts, group_distinct, round2},
};
use serde::{Deserialize, Serialize};

/// The stage vocabulary used when a caller does not supply one.
pub const DEFAULT_STAGES: [&str; 4] = ["visit", "signup", "trial", "paid"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelRow {
    pub stage:                     String,
    pub unique_user_count:         u64,
    pub conversion_from_start_pct: f64,
    pub conversion_from_prev_pct:  f64,
    pub drop_off_from_prev_pct:    f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelTable {
    pub rows: Vec<FunnelRow>,
}

impl FunnelTable {
    pub fn row(&self, stage: &str) -> Option<&FunnelRow> {
        self.rows.iter().find(|r| r.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn compute_funnel<S: AsRef<str>>(events: &[Event], stages: &[S]) -> FunnelTable {
    let users_by_type = distinct_counts(group_distinct(events, |e| {
        Some((e.event_type.as_str(), e.user_id))
    }));

    let counts: Vec<u64> = stages
        .iter()
        .map(|s| users_by_type.get(s.as_ref()).copied().unwrap_or(0) as u64)
        .collect();
    let start = counts.first().copied().unwrap_or(0).max(1) as f64;

    let rows = stages
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(i, (stage, &count))| {
            let from_prev = match i.checked_sub(1).map(|p| counts[p]) {
                None | Some(0) => 100.0,
                Some(prev) => round2(count as f64 / prev as f64 * 100.0),
            };
            FunnelRow {
                stage:                     stage.as_ref().to_string(),
                unique_user_count:         count,
                conversion_from_start_pct: round2(count as f64 / start * 100.0),
                conversion_from_prev_pct:  from_prev,
                drop_off_from_prev_pct:    round2(100.0 - from_prev),
            }
        })
        .collect();

    FunnelTable { rows }
}

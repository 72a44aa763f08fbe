//! Segment engines — paid users broken down by plan and by acquisition source.
//!
//! Both tables keep only users with at least one paid event, each user
//! counted once, inner-joined to the reference table. Users whose
//! plan_id/source_id is null or matches no reference row are dropped
//! rather than reported under an "unknown" bucket.

use crate::{
    snapshot::{paid_user_ids, Event, Plan, Source, User},
    table::{group_distinct, index_by, round2},
    types::UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub plan_name:            String,
    pub paid_users:           u64,
    pub mrr:                  f64,
    pub avg_revenue_per_user: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanMetricsTable {
    pub rows: Vec<PlanMetrics>,
}

impl PlanMetricsTable {
    pub fn row(&self, plan_name: &str) -> Option<&PlanMetrics> {
        self.rows.iter().find(|r| r.plan_name == plan_name)
    }
}

/// Source pricing is not modelled, so only the user count is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetrics {
    pub source_name: String,
    pub paid_users:  u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetricsTable {
    pub rows: Vec<SourceMetrics>,
}

impl SourceMetricsTable {
    pub fn row(&self, source_name: &str) -> Option<&SourceMetrics> {
        self.rows.iter().find(|r| r.source_name == source_name)
    }
}

pub fn compute_plan_metrics(users: &[User], events: &[Event], plans: &[Plan]) -> PlanMetricsTable {
    let paid = paid_user_ids(events);
    let plan_by_id = index_by(plans, |p| p.plan_id);

    // One price per user, even if the users table repeats a user.
    let mut by_plan: BTreeMap<&str, BTreeMap<UserId, f64>> = BTreeMap::new();
    for user in users.iter().filter(|u| paid.contains(&u.user_id)) {
        let Some(plan) = user.plan_id.and_then(|id| plan_by_id.get(&id)) else {
            continue;
        };
        by_plan
            .entry(plan.plan_name.as_str())
            .or_default()
            .entry(user.user_id)
            .or_insert(plan.price);
    }

    let rows = by_plan
        .into_iter()
        .map(|(plan_name, prices)| {
            let mrr: f64 = prices.values().sum();
            let n = prices.len();
            PlanMetrics {
                plan_name:            plan_name.to_string(),
                paid_users:           n as u64,
                mrr:                  round2(mrr),
                avg_revenue_per_user: round2(mrr / n as f64),
            }
        })
        .collect();

    PlanMetricsTable { rows }
}

pub fn compute_source_metrics(users: &[User], events: &[Event], sources: &[Source]) -> SourceMetricsTable {
    let paid = paid_user_ids(events);
    let source_by_id = index_by(sources, |s| s.source_id);

    let by_source = group_distinct(users, |u| {
        if !paid.contains(&u.user_id) {
            return None;
        }
        let source = source_by_id.get(&u.source_id?)?;
        Some((source.source_name.as_str(), u.user_id))
    });

    let rows = by_source
        .into_iter()
        .map(|(source_name, members)| SourceMetrics {
            source_name: source_name.to_string(),
            paid_users:  members.len() as u64,
        })
        .collect();

    SourceMetricsTable { rows }
}

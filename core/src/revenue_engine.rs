//! Revenue engine — paid users, MRR, ARPU and a trailing churn proxy.
//!
//! `churn_rate_pct_30d` is the share of all-time paid users with no paid
//! event in the 30 days ending at `as_of`. It is a retention proxy, not
//! subscription-lifecycle churn: a user who paid once long ago and never
//! cancelled still counts as churned.

use crate::{
    snapshot::{paid_user_ids, Event, Plan, User, PAID_EVENT},
    table::{index_by, mean, round2},
    types::Timestamp,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CHURN_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub paid_count:            u64,
    pub mrr:                   f64,
    pub arpu:                  f64,
    pub avg_rev_per_paid_user: f64,
    pub churn_rate_pct_30d:    f64,
}

pub fn compute_revenue(
    users: &[User],
    events: &[Event],
    plans: &[Plan],
    as_of: Timestamp,
) -> RevenueSummary {
    let paid = paid_user_ids(events);
    if paid.is_empty() {
        return RevenueSummary::default();
    }
    let paid_count = paid.len();

    // Paid users without a plan match contribute nothing, not an error.
    let plan_by_id = index_by(plans, |p| p.plan_id);
    let prices: Vec<f64> = users
        .iter()
        .filter(|u| paid.contains(&u.user_id))
        .filter_map(|u| u.plan_id.and_then(|id| plan_by_id.get(&id)))
        .map(|plan| plan.price)
        .collect();

    let mrr: f64 = prices.iter().sum();
    let arpu = if users.is_empty() { 0.0 } else { mrr / users.len() as f64 };

    let window_start = as_of - Duration::days(CHURN_WINDOW_DAYS);
    let recent_paid: BTreeSet<_> = events
        .iter()
        .filter(|e| e.event_type == PAID_EVENT)
        .filter(|e| e.event_date >= window_start && e.event_date <= as_of)
        .map(|e| e.user_id)
        .collect();
    let churn = 100.0 * (1.0 - recent_paid.len() as f64 / paid_count as f64);

    RevenueSummary {
        paid_count:            paid_count as u64,
        mrr:                   round2(mrr),
        arpu:                  round2(arpu),
        avg_rev_per_paid_user: round2(mean(&prices)),
        churn_rate_pct_30d:    round2(churn),
    }
}

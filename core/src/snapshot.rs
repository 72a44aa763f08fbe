//! Input snapshot — the four immutable tables every engine reads.
//!
//! RULE: Engines never mutate a snapshot and never reach past it.
//! Loaders (store.rs, csv_source.rs, generator.rs) are the only
//! producers; the runner hands out shared references only.

use crate::{
    error::{MetricsError, MetricsResult},
    types::{PlanId, SourceId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The event type that marks a user as paying.
pub const PAID_EVENT: &str = "paid";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id:     UserId,
    pub signup_date: Timestamp,
    pub plan_id:     Option<PlanId>,
    pub source_id:   Option<SourceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id:    UserId,
    pub event_type: String,
    pub event_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id:   PlanId,
    pub plan_name: String,
    pub price:     f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source_id:   SourceId,
    pub source_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub users:   Vec<User>,
    pub events:  Vec<Event>,
    pub plans:   Vec<Plan>,
    pub sources: Vec<Source>,
}

impl InputSnapshot {
    pub fn new(users: Vec<User>, events: Vec<Event>, plans: Vec<Plan>, sources: Vec<Source>) -> Self {
        Self { users, events, plans, sources }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.events.is_empty()
    }

    /// Distinct users that ever produced a paid event.
    pub fn paid_user_ids(&self) -> BTreeSet<UserId> {
        paid_user_ids(&self.events)
    }
}

/// Distinct user ids with at least one `"paid"` event.
pub fn paid_user_ids(events: &[Event]) -> BTreeSet<UserId> {
    events
        .iter()
        .filter(|e| e.event_type == PAID_EVENT)
        .map(|e| e.user_id)
        .collect()
}

// ── Schemas ──────────────────────────────────────────────────────────────────

/// Column contract of one input table, checked before any aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name:    &'static str,
    pub columns: &'static [&'static str],
}

pub const USERS: TableSchema = TableSchema {
    name:    "Users",
    columns: &["user_id", "signup_date", "plan_id", "source_id"],
};

pub const EVENTS: TableSchema = TableSchema {
    name:    "Events",
    columns: &["user_id", "event_type", "event_date"],
};

pub const PLANS: TableSchema = TableSchema {
    name:    "Plans",
    columns: &["plan_id", "plan_name", "price"],
};

pub const SOURCES: TableSchema = TableSchema {
    name:    "Sources",
    columns: &["source_id", "source_name"],
};

impl TableSchema {
    /// Fail on the first required column absent from `present`.
    pub fn check<S: AsRef<str>>(&self, present: &[S]) -> MetricsResult<()> {
        for column in self.columns {
            if !present.iter().any(|p| p.as_ref().trim() == *column) {
                return Err(MetricsError::MissingColumn {
                    table:  self.name.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

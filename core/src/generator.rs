//! Synthetic snapshot generator for demos and tests.
//!
//! Three fixed plans, four fixed sources, users signing up uniformly
//! over a span of days, and events of uniformly random stage type on
//! uniformly random days of the same span. Events are not funnel-shaped;
//! the data exercises the engines, it does not model a real product.

use crate::{
    funnel_engine::DEFAULT_STAGES,
    rng::Stream,
    snapshot::{Event, InputSnapshot, Plan, Source, User},
    types::{PlanId, SourceId, Timestamp},
};
use chrono::{Duration, NaiveDate};

const PLANS: [(PlanId, &str, f64); 3] = [(1, "Basic", 10.0), (2, "Standard", 20.0), (3, "Pro", 50.0)];

const SOURCES: [(SourceId, &str); 4] = [
    (1, "Google Ads"),
    (2, "Organic"),
    (3, "Referral"),
    (4, "Social Media"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSpec {
    pub users:     usize,
    pub events:    usize,
    pub start:     NaiveDate,
    pub span_days: u32,
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        Self {
            users:     100,
            events:    300,
            start:     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            span_days: 100,
        }
    }
}

impl GeneratorSpec {
    fn day(&self, offset: u64) -> Timestamp {
        (self.start + Duration::days(offset as i64))
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
    }
}

pub fn generate(seed: u64, spec: &GeneratorSpec) -> InputSnapshot {
    let span = spec.span_days.max(1) as u64;

    let plans: Vec<Plan> = PLANS
        .iter()
        .map(|&(plan_id, name, price)| Plan { plan_id, plan_name: name.into(), price })
        .collect();
    let sources: Vec<Source> = SOURCES
        .iter()
        .map(|&(source_id, name)| Source { source_id, source_name: name.into() })
        .collect();

    let mut rng = Stream::Users.rng(seed);
    let users: Vec<User> = (1..=spec.users as i64)
        .map(|user_id| User {
            user_id,
            signup_date: spec.day(rng.next_u64_below(span)),
            plan_id:     Some(rng.pick(&PLANS).0),
            source_id:   Some(rng.pick(&SOURCES).0),
        })
        .collect();

    let mut rng = Stream::Events.rng(seed);
    let events: Vec<Event> = if users.is_empty() {
        Vec::new()
    } else {
        (0..spec.events)
            .map(|_| Event {
                user_id:    rng.pick(&users).user_id,
                event_type: rng.pick(&DEFAULT_STAGES).to_string(),
                event_date: spec.day(rng.next_u64_below(span)),
            })
            .collect()
    };

    log::info!(
        "generated snapshot (seed {seed}): {} users, {} events",
        users.len(),
        events.len()
    );
    InputSnapshot::new(users, events, plans, sources)
}

//! The metrics runner — composes all six engines over one snapshot.
//!
//! EXECUTION ORDER (fixed, documented):
//!   1. Funnel
//!   2. Revenue
//!   3. Cohort
//!   4. Weekly growth
//!   5. Plan metrics
//!   6. Source metrics
//!
//! RULES:
//!   - Engines read ONLY the shared snapshot and the run parameters.
//!   - No engine reads another engine's output.
//!   - `run` and `run_concurrent` produce identical bundles; only the
//!     order of `EngineFinished` events differs under concurrency.

use crate::{
    cohort_engine::{compute_cohort_retention, CohortBucket, CohortMatrix},
    error::{MetricsError, MetricsResult},
    event::{EngineKind, RunEvent},
    funnel_engine::{compute_funnel, FunnelTable, DEFAULT_STAGES},
    growth_engine::{compute_weekly_growth, GrowthMetric, WeeklyGrowthSeries},
    observer::{LogObserver, RunObserver},
    revenue_engine::{compute_revenue, RevenueSummary},
    segment_engine::{
        compute_plan_metrics, compute_source_metrics, PlanMetricsTable, SourceMetricsTable,
    },
    snapshot::InputSnapshot,
    types::Timestamp,
};
use serde::{Deserialize, Serialize};
use std::thread;

pub const DEFAULT_GROWTH_WINDOW_WEEKS: u32 = 12;

/// Everything the engines need besides the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub stages:              Vec<String>,
    pub cohort_bucket:       CohortBucket,
    pub growth_metric:       GrowthMetric,
    pub growth_window_weeks: u32,
    /// End of the revenue churn window and of the growth window.
    pub as_of:               Timestamp,
}

impl RunParams {
    /// Dashboard defaults: four-stage funnel, weekly cohorts,
    /// weekly signups over 12 weeks.
    pub fn new(as_of: Timestamp) -> Self {
        Self {
            stages:              DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
            cohort_bucket:       CohortBucket::Week,
            growth_metric:       GrowthMetric::event_type("signup"),
            growth_window_weeks: DEFAULT_GROWTH_WINDOW_WEEKS,
            as_of,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub funnel:         FunnelTable,
    pub revenue:        RevenueSummary,
    pub cohort:         CohortMatrix,
    pub weekly_growth:  WeeklyGrowthSeries,
    pub plan_metrics:   PlanMetricsTable,
    pub source_metrics: SourceMetricsTable,
}

pub struct MetricsRunner<O: RunObserver = LogObserver> {
    params:   RunParams,
    observer: O,
}

impl MetricsRunner<LogObserver> {
    pub fn with_logging(params: RunParams) -> Self {
        Self::new(params, LogObserver)
    }
}

impl<O: RunObserver> MetricsRunner<O> {
    pub fn new(params: RunParams, observer: O) -> Self {
        Self { params, observer }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Run every engine in execution order on the calling thread.
    pub fn run(&self, snapshot: &InputSnapshot) -> MetricsResult<MetricsBundle> {
        self.started(snapshot);
        let bundle = MetricsBundle {
            funnel:         self.funnel(snapshot),
            revenue:        self.revenue(snapshot),
            cohort:         self.cohort(snapshot),
            weekly_growth:  self.weekly_growth(snapshot),
            plan_metrics:   self.plan_metrics(snapshot),
            source_metrics: self.source_metrics(snapshot),
        };
        self.completed();
        Ok(bundle)
    }

    /// Run every engine on its own scoped worker thread.
    pub fn run_concurrent(&self, snapshot: &InputSnapshot) -> MetricsResult<MetricsBundle> {
        self.started(snapshot);
        let bundle = thread::scope(|scope| {
            let funnel = scope.spawn(|| self.funnel(snapshot));
            let revenue = scope.spawn(|| self.revenue(snapshot));
            let cohort = scope.spawn(|| self.cohort(snapshot));
            let weekly_growth = scope.spawn(|| self.weekly_growth(snapshot));
            let plan_metrics = scope.spawn(|| self.plan_metrics(snapshot));
            let source_metrics = scope.spawn(|| self.source_metrics(snapshot));

            // Join every worker before surfacing the first failure.
            let (funnel, revenue, cohort, weekly_growth, plan_metrics, source_metrics) = (
                funnel.join(),
                revenue.join(),
                cohort.join(),
                weekly_growth.join(),
                plan_metrics.join(),
                source_metrics.join(),
            );
            Ok::<_, MetricsError>(MetricsBundle {
                funnel:         joined(EngineKind::Funnel, funnel)?,
                revenue:        joined(EngineKind::Revenue, revenue)?,
                cohort:         joined(EngineKind::Cohort, cohort)?,
                weekly_growth:  joined(EngineKind::WeeklyGrowth, weekly_growth)?,
                plan_metrics:   joined(EngineKind::PlanMetrics, plan_metrics)?,
                source_metrics: joined(EngineKind::SourceMetrics, source_metrics)?,
            })
        })?;
        self.completed();
        Ok(bundle)
    }

    // ── Engines ──────────────────────────────────────────────────────────────

    fn funnel(&self, s: &InputSnapshot) -> FunnelTable {
        let out = compute_funnel(&s.events, &self.params.stages);
        self.finished(EngineKind::Funnel, out.len());
        out
    }

    fn revenue(&self, s: &InputSnapshot) -> RevenueSummary {
        let out = compute_revenue(&s.users, &s.events, &s.plans, self.params.as_of);
        self.finished(EngineKind::Revenue, 1);
        out
    }

    fn cohort(&self, s: &InputSnapshot) -> CohortMatrix {
        let out = compute_cohort_retention(&s.users, &s.events, self.params.cohort_bucket);
        self.finished(EngineKind::Cohort, out.rows.len());
        out
    }

    fn weekly_growth(&self, s: &InputSnapshot) -> WeeklyGrowthSeries {
        let out = compute_weekly_growth(
            &s.events,
            &self.params.growth_metric,
            self.params.growth_window_weeks,
            self.params.as_of,
        );
        self.finished(EngineKind::WeeklyGrowth, out.len());
        out
    }

    fn plan_metrics(&self, s: &InputSnapshot) -> PlanMetricsTable {
        let out = compute_plan_metrics(&s.users, &s.events, &s.plans);
        self.finished(EngineKind::PlanMetrics, out.rows.len());
        out
    }

    fn source_metrics(&self, s: &InputSnapshot) -> SourceMetricsTable {
        let out = compute_source_metrics(&s.users, &s.events, &s.sources);
        self.finished(EngineKind::SourceMetrics, out.rows.len());
        out
    }

    // ── Observer plumbing ────────────────────────────────────────────────────

    fn started(&self, s: &InputSnapshot) {
        self.observer.on_event(&RunEvent::RunStarted {
            users:   s.users.len(),
            events:  s.events.len(),
            plans:   s.plans.len(),
            sources: s.sources.len(),
        });
    }

    fn finished(&self, engine: EngineKind, rows: usize) {
        self.observer.on_event(&RunEvent::EngineFinished { engine, rows });
    }

    fn completed(&self) {
        self.observer.on_event(&RunEvent::RunCompleted {
            engines: EngineKind::ALL.len(),
        });
    }
}

fn joined<T>(engine: EngineKind, result: thread::Result<T>) -> MetricsResult<T> {
    result.map_err(|_| MetricsError::EnginePanicked { engine: engine.name() })
}

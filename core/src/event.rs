//! Run events — what the runner reports to its observer.
//!
//! Variants are append-only; tooling matches on the serialized `type` tag.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        users:   usize,
        events:  usize,
        plans:   usize,
        sources: usize,
    },
    EngineFinished {
        engine: EngineKind,
        rows:   usize,
    },
    RunCompleted {
        engines: usize,
    },
}

/// The six engines, in the runner's documented execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Funnel,
    Revenue,
    Cohort,
    WeeklyGrowth,
    PlanMetrics,
    SourceMetrics,
}

impl EngineKind {
    pub const ALL: [EngineKind; 6] = [
        Self::Funnel,
        Self::Revenue,
        Self::Cohort,
        Self::WeeklyGrowth,
        Self::PlanMetrics,
        Self::SourceMetrics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Funnel        => "funnel",
            Self::Revenue       => "revenue",
            Self::Cohort        => "cohort",
            Self::WeeklyGrowth  => "weekly_growth",
            Self::PlanMetrics   => "plan_metrics",
            Self::SourceMetrics => "source_metrics",
        }
    }
}

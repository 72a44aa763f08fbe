//! Metrics configuration — dashboard parameters loaded from JSON.

use crate::{
    cohort_engine::CohortBucket,
    display::DisplayFilter,
    error::MetricsResult,
    funnel_engine::DEFAULT_STAGES,
    growth_engine::GrowthMetric,
    runner::{RunParams, DEFAULT_GROWTH_WINDOW_WEEKS},
    types::Timestamp,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Every field is optional in the file; missing fields take the
/// dashboard defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Ordered funnel stages.
    pub stages:              Vec<String>,
    /// `"week"` or `"month"`.
    pub cohort_bucket:       String,
    /// `"active_users"`, `"signups"`, `"visits"`, `"trials"`, `"paid"` or `"event:<type>"`.
    pub growth_metric:       String,
    pub growth_window_weeks: u32,
    /// Display only: growth weeks older than this are hidden.
    pub lookback_days:       u32,
    /// Display only: funnel stages shown.
    pub event_types:         Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let stages: Vec<String> = DEFAULT_STAGES.iter().map(|s| s.to_string()).collect();
        Self {
            event_types:         stages.clone(),
            stages,
            cohort_bucket:       "week".into(),
            growth_metric:       "signups".into(),
            growth_window_weeks: DEFAULT_GROWTH_WINDOW_WEEKS,
            lookback_days:       DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl MetricsConfig {
    /// Load from a JSON file.
    /// In tests, use MetricsConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: MetricsConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        // Surface bad names at load time, not at first run.
        config.run_params(Timestamp::default())?;
        Ok(config)
    }

    /// Resolve names into typed run parameters.
    pub fn run_params(&self, as_of: Timestamp) -> MetricsResult<RunParams> {
        Ok(RunParams {
            stages:              self.stages.clone(),
            cohort_bucket:       self.cohort_bucket.parse::<CohortBucket>()?,
            growth_metric:       self.growth_metric.parse::<GrowthMetric>()?,
            growth_window_weeks: self.growth_window_weeks,
            as_of,
        })
    }

    pub fn display_filter(&self) -> DisplayFilter {
        DisplayFilter {
            lookback_days: self.lookback_days,
            event_types:   self.event_types.clone(),
        }
    }
}

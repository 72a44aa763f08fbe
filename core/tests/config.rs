//! Configuration loading and the display filter.

use chrono::NaiveDate;
use funnel_core::{
    calendar::parse_timestamp,
    cohort_engine::{CohortBucket, CohortMatrix},
    config::MetricsConfig,
    display::DisplayFilter,
    error::MetricsError,
    funnel_engine::{compute_funnel, DEFAULT_STAGES},
    generator::{generate, GeneratorSpec},
    growth_engine::{GrowthMetric, GrowthPoint, WeeklyGrowthSeries},
    revenue_engine::RevenueSummary,
    observer::NullObserver,
    runner::{MetricsBundle, MetricsRunner},
    segment_engine::{PlanMetricsTable, SourceMetricsTable},
    types::Timestamp,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn ts(s: &str) -> Timestamp {
    parse_timestamp(s).unwrap()
}

fn point(m: u32, d: u32) -> GrowthPoint {
    GrowthPoint {
        week_start: NaiveDate::from_ymd_opt(2025, m, d).unwrap(),
        value:      1,
        pct_change: 0.0,
    }
}

fn bundle() -> MetricsBundle {
    MetricsBundle {
        funnel:         compute_funnel(&[], &DEFAULT_STAGES),
        revenue:        RevenueSummary::default(),
        cohort:         CohortMatrix::empty(CohortBucket::Week),
        weekly_growth:  WeeklyGrowthSeries {
            points: vec![point(2, 24), point(3, 3), point(3, 10), point(3, 17)],
        },
        plan_metrics:   PlanMetricsTable::default(),
        source_metrics: SourceMetricsTable::default(),
    }
}

fn write_config(name: &str, body: &str) -> String {
    let path = std::env::temp_dir().join(format!("funnel-core-{name}-{}.json", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Defaults match the dashboard.
#[test]
fn default_config_resolves() {
    let config = MetricsConfig::default();
    let params = config.run_params(ts("2025-03-01")).unwrap();
    assert_eq!(params.stages, DEFAULT_STAGES.to_vec());
    assert_eq!(params.cohort_bucket, CohortBucket::Week);
    assert_eq!(params.growth_metric, GrowthMetric::event_type("signup"));
    assert_eq!(params.growth_window_weeks, 12);
    assert_eq!(config.display_filter().lookback_days, 30);
}

/// Missing fields in the file take defaults.
#[test]
fn partial_file_loads() {
    let path = write_config("partial", r#"{ "cohort_bucket": "month", "lookback_days": 90 }"#);
    let config = MetricsConfig::load(&path).unwrap();
    assert_eq!(config.cohort_bucket, "month");
    assert_eq!(config.lookback_days, 90);
    assert_eq!(config.growth_metric, "signups");
    let _ = std::fs::remove_file(&path);
}

/// Unknown metric names are rejected at load time.
#[test]
fn invalid_names_fail_load() {
    let path = write_config("invalid", r#"{ "growth_metric": "revenue" }"#);
    let err = MetricsConfig::load(&path).unwrap_err();
    assert!(
        matches!(err.downcast_ref::<MetricsError>(), Some(MetricsError::InvalidArgument { .. })),
        "unexpected error: {err}"
    );
    let _ = std::fs::remove_file(&path);

    assert!(MetricsConfig::load("/nonexistent/metrics.json").is_err());
}

/// Growth weeks before now - lookback are hidden.
#[test]
fn lookback_hides_old_weeks() {
    let filter = DisplayFilter { lookback_days: 14, event_types: DEFAULT_STAGES.map(String::from).to_vec() };
    let filtered = filter.apply(bundle(), ts("2025-03-17 12:00:00"));
    let weeks: Vec<String> = filtered
        .weekly_growth
        .points
        .iter()
        .map(|p| p.week_start.to_string())
        .collect();
    // Cutoff is 2025-03-03 12:00; that week's Monday midnight falls before it.
    assert_eq!(weeks, vec!["2025-03-10", "2025-03-17"]);
    assert_eq!(filtered.funnel.len(), 4);
}

/// Funnel rows outside the allowlist are hidden; percentages are untouched.
#[test]
fn allowlist_hides_funnel_rows() {
    let filter = DisplayFilter { lookback_days: 365, event_types: vec!["visit".into(), "paid".into()] };
    let original = bundle();
    let filtered = filter.apply(original.clone(), ts("2025-03-17"));
    let stages: Vec<&str> = filtered.funnel.rows.iter().map(|r| r.stage.as_str()).collect();
    assert_eq!(stages, vec!["visit", "paid"]);
    assert_eq!(filtered.funnel.row("paid"), original.funnel.row("paid"));
    assert_eq!(filtered.weekly_growth.len(), 4);
}

/// Maximal windows load, run and filter without overflowing.
#[test]
fn maximal_windows_run_to_completion() {
    let path = write_config(
        "maximal",
        r#"{ "growth_window_weeks": 4294967295, "lookback_days": 4294967295 }"#,
    );
    let config = MetricsConfig::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let as_of = ts("2025-04-15");
    let snapshot = generate(3, &GeneratorSpec::default());
    let runner = MetricsRunner::new(config.run_params(as_of).unwrap(), NullObserver);
    let sequential = runner.run(&snapshot).unwrap();
    let concurrent = runner.run_concurrent(&snapshot).unwrap();
    assert_eq!(sequential, concurrent);
    assert!(!sequential.weekly_growth.is_empty());

    let filtered = config.display_filter().apply(sequential.clone(), as_of);
    assert_eq!(filtered.weekly_growth, sequential.weekly_growth, "nothing is older than the lookback");
}

/// Read and parse failures name the file.
#[test]
fn load_errors_name_the_file() {
    let err = MetricsConfig::load("/nonexistent/metrics.json").unwrap_err();
    assert!(err.to_string().starts_with("Cannot read /nonexistent/metrics.json"), "got: {err}");

    let path = write_config("malformed", "{ not json");
    let err = MetricsConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("Cannot parse"), "got: {err}");
    let _ = std::fs::remove_file(&path);
}

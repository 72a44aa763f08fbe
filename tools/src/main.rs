//! metrics-runner: headless metrics runner for the SaaS funnel dashboard.
//!
//! Usage:
//!   metrics-runner --db saas.db
//!   metrics-runner --csv-dir ./data --as-of 2025-04-15
//!   metrics-runner --generate 42 --users 100 --events 300 --write-csv ./data
//!   metrics-runner --generate 42 --db saas.db          (seed a database)
//!   metrics-runner --db saas.db --config metrics.json --json

use anyhow::{bail, Result};
use chrono::Utc;
use funnel_core::{
    calendar::parse_timestamp,
    config::MetricsConfig,
    csv_source,
    generator::{self, GeneratorSpec},
    runner::{MetricsBundle, MetricsRunner},
    snapshot::InputSnapshot,
    store::SnapshotStore,
    types::Timestamp,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().any(|a| a == "--json");
    let concurrent = args.iter().any(|a| a == "--concurrent");
    let db = arg_value(&args, "--db");
    let csv_dir = arg_value(&args, "--csv-dir");
    let write_csv = arg_value(&args, "--write-csv");
    let seed = parse_seed(arg_value(&args, "--generate"))?;

    let config = match arg_value(&args, "--config") {
        Some(path) => MetricsConfig::load(path)?,
        None => MetricsConfig::default(),
    };
    let as_of: Timestamp = match arg_value(&args, "--as-of") {
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => ts,
            None => bail!("--as-of: cannot parse '{raw}'"),
        },
        None => Utc::now().naive_utc(),
    };

    let snapshot = match (seed, db, csv_dir) {
        (Some(seed), db, None) => {
            let spec = GeneratorSpec {
                users: parse_arg(&args, "--users", 100usize),
                events: parse_arg(&args, "--events", 300usize),
                ..GeneratorSpec::default()
            };
            let snapshot = generator::generate(seed, &spec);
            if let Some(path) = db {
                let mut store = SnapshotStore::open(path)?;
                store.migrate()?;
                store.save_snapshot(&snapshot)?;
            }
            snapshot
        }
        (None, Some(path), None) => SnapshotStore::open(path)?.load_snapshot()?,
        (None, None, Some(dir)) => csv_source::load_dir(dir)?,
        _ => bail!("choose exactly one source: --db PATH, --csv-dir DIR or --generate SEED"),
    };

    if snapshot.is_empty() {
        log::warn!("snapshot has no users or events; every metric will be empty");
    }

    if let Some(dir) = write_csv {
        csv_source::write_dir(&snapshot, dir)?;
    }

    let runner = MetricsRunner::with_logging(config.run_params(as_of)?);
    let bundle = if concurrent {
        runner.run_concurrent(&snapshot)?
    } else {
        runner.run(&snapshot)?
    };
    let bundle = config.display_filter().apply(bundle, as_of);

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        print_summary(&snapshot, &bundle, as_of, config.lookback_days);
    }
    Ok(())
}

fn print_summary(snapshot: &InputSnapshot, bundle: &MetricsBundle, as_of: Timestamp, lookback_days: u32) {
    println!("=== SNAPSHOT ===");
    println!("  users:    {}", snapshot.users.len());
    println!("  events:   {}", snapshot.events.len());
    println!("  plans:    {}", snapshot.plans.len());
    println!("  sources:  {}", snapshot.sources.len());
    println!("  as of:    {as_of}");

    println!();
    println!("=== FUNNEL ===");
    for row in &bundle.funnel.rows {
        println!(
            "  {:<10} {:>6} users | start {:>6.2}% | prev {:>6.2}% | drop {:>6.2}%",
            row.stage,
            row.unique_user_count,
            row.conversion_from_start_pct,
            row.conversion_from_prev_pct,
            row.drop_off_from_prev_pct
        );
    }

    let r = &bundle.revenue;
    println!();
    println!("=== REVENUE ===");
    println!("  paid users:          {}", r.paid_count);
    println!("  MRR:                 ${:.2}", r.mrr);
    println!("  ARPU:                ${:.2}", r.arpu);
    println!("  avg rev / paid user: ${:.2}", r.avg_rev_per_paid_user);
    println!("  churn (30d):         {:.2}%", r.churn_rate_pct_30d);

    println!();
    println!("=== COHORT RETENTION (% by week since signup) ===");
    if bundle.cohort.is_empty() {
        println!("  (Cohort data not available)");
    } else {
        let header: Vec<String> = bundle.cohort.periods.iter().map(|p| format!("{p:>6}")).collect();
        println!("  {:<10} {:>5} {}", "cohort", "size", header.join(""));
        for row in &bundle.cohort.rows {
            let cells: Vec<String> = row.retention_pct.iter().map(|v| format!("{v:>6.1}")).collect();
            println!("  {} {:>5} {}", row.cohort_start, row.cohort_size, cells.join(""));
        }
    }

    println!();
    println!("=== WEEKLY GROWTH (last {lookback_days} days) ===");
    if bundle.weekly_growth.is_empty() {
        println!("  (No activity in window)");
    }
    for p in &bundle.weekly_growth.points {
        println!("  {} | {:>5} | {:>+8.2}%", p.week_start, p.value, p.pct_change);
    }

    println!();
    println!("=== PLAN METRICS ===");
    for p in &bundle.plan_metrics.rows {
        println!(
            "  {:<12} {:>4} paid | MRR ${:>9.2} | avg ${:>7.2}",
            p.plan_name, p.paid_users, p.mrr, p.avg_revenue_per_user
        );
    }

    println!();
    println!("=== SOURCE METRICS ===");
    for s in &bundle.source_metrics.rows {
        println!("  {:<14} {:>4} paid", s.source_name, s.paid_users);
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_seed(raw: Option<&str>) -> Result<Option<u64>> {
    match raw {
        None => Ok(None),
        Some(raw) => match raw.parse() {
            Ok(seed) => Ok(Some(seed)),
            Err(e) => bail!("--generate: invalid seed '{raw}': {e}"),
        },
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

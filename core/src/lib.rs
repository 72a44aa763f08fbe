//! Product-analytics metrics over a four-table snapshot
//! (Users, Events, Plans, Sources).
//!
//! The engines (`*_engine` modules) are pure functions over an
//! `InputSnapshot`; `runner` composes them. `store`, `csv_source` and
//! `generator` produce snapshots; `display` trims finished results.

pub mod calendar;
pub mod cohort_engine;
pub mod config;
pub mod csv_source;
pub mod display;
pub mod error;
pub mod event;
pub mod funnel_engine;
pub mod generator;
pub mod growth_engine;
pub mod observer;
pub mod revenue_engine;
pub mod rng;
pub mod runner;
pub mod segment_engine;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod types;

pub use error::{MetricsError, MetricsResult};
pub use runner::{MetricsBundle, MetricsRunner, RunParams};
pub use snapshot::InputSnapshot;

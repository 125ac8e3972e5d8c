//! Pulse Metrics - Deterministic behavioral analytics for product usage data
//!
//! Pulse turns a snapshot of users and timestamped events into product
//! metrics: daily/monthly active users, cohort retention, churn by plan,
//! feature adoption, engagement scores and cohort activation.
//!
//! ## Pipeline
//!
//! raw export → [`schema`] validation → [`Dataset`] snapshot → [`analyzers`]
//! → [`report`]
//!
//! Every analyzer is a pure function of one snapshot and one
//! [`AnalyticsConfig`], so recomputing with the same inputs yields identical
//! rows. [`MetricsEngine`] runs them side by side.

pub mod analyzers;
pub mod calendar;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod report;
pub mod schema;
pub mod stats;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use config::AnalyticsConfig;
pub use dataset::Dataset;
pub use engine::{compute_report_json, MetricsEngine};
pub use error::{ComputeError, ConfigError, DataIntegrityError};
pub use report::{AnalyticsReport, ReportEncoder};
pub use schema::{RawEvent, RawUser, SnapshotLoader};
pub use types::{Event, Plan, User};

/// Pulse version embedded in every report
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "pulse-metrics";

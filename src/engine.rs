//! Engine orchestration
//!
//! This module provides the public entry points for computing metrics. It
//! pairs one validated configuration with one immutable snapshot and runs
//! analyzers against them, either one at a time or all together.

use std::thread::{self, ScopedJoinHandle};

use crate::analyzers::{
    churn_by_plan, classify_users, cohort_activation, cohort_activity, daily_active_users,
    engagement_scores, feature_adoption, monthly_active_users, plan_distribution,
    retention_by_cohort, segment_distribution, user_segments, ActivationRow, Analyzer, ChurnLabel,
    ChurnRow, CohortActivityRow, DailyActiveUsers, EngagementScore, FeatureAdoptionRow,
    MonthlyActiveUsers, PlanShare, RetentionRow, UserSegment,
};
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::report::{AnalyticsReport, ReportEncoder, ReportMetrics};
use crate::schema::{RawEvent, RawUser, SnapshotLoader};

/// Compute a full report from JSON-array exports (stateless, one-shot).
///
/// # Arguments
/// * `users_json` - JSON array of user records
/// * `events_json` - JSON array of event records
/// * `config_json` - JSON configuration; must at least set `as_of_date`
///
/// # Returns
/// Pretty-printed report JSON
///
/// # Example
/// ```ignore
/// let report = compute_report_json(users, events, r#"{"as_of_date": "2024-12-31"}"#)?;
/// ```
pub fn compute_report_json(
    users_json: &str,
    events_json: &str,
    config_json: &str,
) -> Result<String, ComputeError> {
    let config = AnalyticsConfig::from_json(config_json)?;
    config.validate()?;

    let users: Vec<RawUser> = SnapshotLoader::parse_array(users_json)?;
    let events: Vec<RawEvent> = SnapshotLoader::parse_array(events_json)?;
    let dataset = SnapshotLoader::build_dataset(&users, &events)?;

    MetricsEngine::new(dataset, config)?.report_json()
}

/// A snapshot paired with a validated configuration
///
/// The snapshot is shared read-only by every computation, so results within
/// one engine are mutually consistent.
pub struct MetricsEngine {
    dataset: Dataset,
    config: AnalyticsConfig,
    encoder: ReportEncoder,
}

impl MetricsEngine {
    /// Create an engine, rejecting an invalid configuration up front
    pub fn new(dataset: Dataset, config: AnalyticsConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            dataset,
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Use a specific report encoder (e.g. a fixed run ID)
    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run a single analyzer
    pub fn run<A: Analyzer>(&self, analyzer: &A) -> Result<A::Output, ComputeError> {
        let output = analyzer.analyze(&self.dataset, &self.config)?;
        tracing::debug!(analyzer = analyzer.name(), "analyzer finished");
        Ok(output)
    }

    pub fn daily_active_users(&self) -> Vec<DailyActiveUsers> {
        daily_active_users(&self.dataset)
    }

    pub fn monthly_active_users(&self) -> Vec<MonthlyActiveUsers> {
        monthly_active_users(&self.dataset)
    }

    pub fn retention(&self) -> Result<Vec<RetentionRow>, ComputeError> {
        retention_by_cohort(&self.dataset, &self.config)
    }

    pub fn churn_labels(&self) -> Result<Vec<ChurnLabel>, ComputeError> {
        classify_users(&self.dataset, &self.config)
    }

    pub fn churn(&self) -> Result<Vec<ChurnRow>, ComputeError> {
        churn_by_plan(&self.dataset, &self.config)
    }

    pub fn feature_adoption(&self) -> Vec<FeatureAdoptionRow> {
        feature_adoption(&self.dataset)
    }

    pub fn engagement(&self) -> Result<Vec<EngagementScore>, ComputeError> {
        engagement_scores(&self.dataset, &self.config)
    }

    pub fn activation(&self) -> Result<Vec<ActivationRow>, ComputeError> {
        cohort_activation(&self.dataset, &self.config)
    }

    pub fn segments(&self) -> Result<Vec<UserSegment>, ComputeError> {
        user_segments(&self.dataset, &self.config)
    }

    pub fn cohort_activity(&self) -> Vec<CohortActivityRow> {
        cohort_activity(&self.dataset)
    }

    pub fn plan_distribution(&self) -> Vec<PlanShare> {
        plan_distribution(&self.dataset)
    }

    /// Compute every metric, each on its own scoped worker thread
    ///
    /// Workers only read the snapshot. If any analyzer fails, the whole
    /// batch fails and no partial metrics are returned.
    pub fn metrics(&self) -> Result<ReportMetrics, ComputeError> {
        thread::scope(|s| -> Result<ReportMetrics, ComputeError> {
            let daily = s.spawn(|| self.daily_active_users());
            let monthly = s.spawn(|| self.monthly_active_users());
            let retention = s.spawn(|| self.retention());
            let churn = s.spawn(|| self.churn());
            let adoption = s.spawn(|| self.feature_adoption());
            let engagement = s.spawn(|| self.engagement());
            let activation = s.spawn(|| self.activation());
            let segments = s.spawn(|| self.segments());
            let cohorts = s.spawn(|| self.cohort_activity());
            let plans = s.spawn(|| self.plan_distribution());

            let metrics = ReportMetrics {
                daily_active_users: join(daily),
                monthly_active_users: join(monthly),
                retention: join(retention)?,
                churn: join(churn)?,
                feature_adoption: join(adoption),
                engagement: join(engagement)?,
                activation: join(activation)?,
                segments: segment_distribution(&join(segments)?),
                cohort_activity: join(cohorts),
                plan_distribution: join(plans),
            };
            tracing::debug!(
                days = metrics.daily_active_users.len(),
                cohorts = metrics.retention.len(),
                features = metrics.feature_adoption.len(),
                "all metrics computed"
            );
            Ok(metrics)
        })
    }

    /// Compute every metric and assemble the report
    pub fn report(&self) -> Result<AnalyticsReport, ComputeError> {
        let as_of = self.config.require_as_of_date()?;
        let metrics = self.metrics()?;
        Ok(self.encoder.encode(&self.dataset, as_of, metrics))
    }

    /// Compute every metric and encode the report as pretty JSON
    pub fn report_json(&self) -> Result<String, ComputeError> {
        let as_of = self.config.require_as_of_date()?;
        let metrics = self.metrics()?;
        self.encoder.encode_to_json(&self.dataset, as_of, metrics)
    }

    /// Export documents as `(file stem, pretty JSON)` pairs: the full
    /// report, one document per metric, and the per-user segments
    pub fn export_documents(&self) -> Result<Vec<(&'static str, String)>, ComputeError> {
        let report = self.report()?;
        let user_segments = self.segments()?;
        let metrics = &report.metrics;

        Ok(vec![
            ("report", to_pretty(&report)?),
            ("daily_active_users", to_pretty(&metrics.daily_active_users)?),
            ("monthly_active_users", to_pretty(&metrics.monthly_active_users)?),
            ("retention", to_pretty(&metrics.retention)?),
            ("churn", to_pretty(&metrics.churn)?),
            ("feature_adoption", to_pretty(&metrics.feature_adoption)?),
            ("engagement", to_pretty(&metrics.engagement)?),
            ("activation", to_pretty(&metrics.activation)?),
            ("user_segments", to_pretty(&user_segments)?),
            ("segment_distribution", to_pretty(&metrics.segments)?),
            ("cohort_activity", to_pretty(&metrics.cohort_activity)?),
            ("plan_distribution", to_pretty(&metrics.plan_distribution)?),
        ])
    }
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ComputeError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Join a worker, re-raising its panic on this thread
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

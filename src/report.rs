//! Report assembly
//!
//! Collects every metric into one [`AnalyticsReport`] with headline KPIs and
//! producer metadata. The metric sections are deterministic for a given
//! snapshot and configuration; only `producer.run_id` and `generated_at`
//! differ between runs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzers::{
    ActivationRow, ChurnRow, CohortActivityRow, DailyActiveUsers, EngagementScore,
    FeatureAdoptionRow, MonthlyActiveUsers, PlanShare, RetentionRow, SegmentCount,
};
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::{mean, percentage, ratio, round2};
use crate::{PRODUCER_NAME, PULSE_VERSION};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Number of features listed in the summary
pub const TOP_FEATURES: usize = 3;

/// Who produced a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub run_id: String,
}

/// Headline KPIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_users: usize,
    pub total_events: usize,
    pub events_per_user: f64,
    /// DAU of the most recent day with events
    pub latest_dau: usize,
    /// MAU of the most recent month with events
    pub latest_mau: usize,
    /// `latest_dau` as a percentage of `latest_mau`
    pub dau_mau_ratio: f64,
    /// Unweighted mean of cohort retention rates
    pub average_retention_rate: f64,
    /// Unweighted mean of plan churn rates
    pub average_churn_rate: f64,
    pub top_features: Vec<FeatureAdoptionRow>,
}

/// Every metric's rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub daily_active_users: Vec<DailyActiveUsers>,
    pub monthly_active_users: Vec<MonthlyActiveUsers>,
    pub retention: Vec<RetentionRow>,
    pub churn: Vec<ChurnRow>,
    pub feature_adoption: Vec<FeatureAdoptionRow>,
    pub engagement: Vec<EngagementScore>,
    pub activation: Vec<ActivationRow>,
    pub segments: Vec<SegmentCount>,
    pub cohort_activity: Vec<CohortActivityRow>,
    pub plan_distribution: Vec<PlanShare>,
}

/// Complete analytics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub generated_at: DateTime<Utc>,
    pub as_of_date: NaiveDate,
    pub summary: ReportSummary,
    pub metrics: ReportMetrics,
}

impl ReportSummary {
    /// Derive KPIs from the snapshot and computed metrics
    pub fn from_metrics(dataset: &Dataset, metrics: &ReportMetrics) -> Self {
        let total_users = dataset.user_count();
        let total_events = dataset.event_count();
        let events_per_user = ratio(total_events, total_users);

        let latest_dau = metrics
            .daily_active_users
            .last()
            .map_or(0, |d| d.active_users);
        let latest_mau = metrics
            .monthly_active_users
            .last()
            .map_or(0, |m| m.active_users);

        let average_retention_rate = mean(metrics.retention.iter().map(|r| r.retention_rate))
            .map_or(0.0, round2);
        let average_churn_rate =
            mean(metrics.churn.iter().map(|r| r.churn_rate)).map_or(0.0, round2);

        Self {
            total_users,
            total_events,
            events_per_user,
            latest_dau,
            latest_mau,
            dau_mau_ratio: percentage(latest_dau, latest_mau),
            average_retention_rate,
            average_churn_rate,
            top_features: metrics
                .feature_adoption
                .iter()
                .take(TOP_FEATURES)
                .cloned()
                .collect(),
        }
    }
}

/// Encoder stamping reports with producer metadata
pub struct ReportEncoder {
    run_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create an encoder with a fresh run ID
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific run ID
    pub fn with_run_id(run_id: String) -> Self {
        Self { run_id }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Assemble a report from computed metrics
    pub fn encode(
        &self,
        dataset: &Dataset,
        as_of_date: NaiveDate,
        metrics: ReportMetrics,
    ) -> AnalyticsReport {
        let summary = ReportSummary::from_metrics(dataset, &metrics);
        AnalyticsReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSE_VERSION.to_string(),
                run_id: self.run_id.clone(),
            },
            generated_at: Utc::now(),
            as_of_date,
            summary,
            metrics,
        }
    }

    /// Assemble and serialize to pretty JSON
    pub fn encode_to_json(
        &self,
        dataset: &Dataset,
        as_of_date: NaiveDate,
        metrics: ReportMetrics,
    ) -> Result<String, ComputeError> {
        let report = self.encode(dataset, as_of_date, metrics);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{
        churn_by_plan, cohort_activation, cohort_activity, daily_active_users,
        engagement_scores, feature_adoption, monthly_active_users, plan_distribution,
        retention_by_cohort, segment_distribution, user_segments,
    };
    use crate::fixtures::{config, day, sample_dataset};

    fn sample_metrics(ds: &Dataset) -> ReportMetrics {
        let cfg = config();
        ReportMetrics {
            daily_active_users: daily_active_users(ds),
            monthly_active_users: monthly_active_users(ds),
            retention: retention_by_cohort(ds, &cfg).unwrap(),
            churn: churn_by_plan(ds, &cfg).unwrap(),
            feature_adoption: feature_adoption(ds),
            engagement: engagement_scores(ds, &cfg).unwrap(),
            activation: cohort_activation(ds, &cfg).unwrap(),
            segments: segment_distribution(&user_segments(ds, &cfg).unwrap()),
            cohort_activity: cohort_activity(ds),
            plan_distribution: plan_distribution(ds),
        }
    }

    #[test]
    fn test_summary_kpis() {
        let ds = sample_dataset();
        let summary = ReportSummary::from_metrics(&ds, &sample_metrics(&ds));

        assert_eq!(summary.total_users, 4);
        assert_eq!(summary.total_events, 7);
        assert_eq!(summary.events_per_user, 1.75);
        assert_eq!(summary.latest_dau, 1);
        assert_eq!(summary.latest_mau, 1);
        assert_eq!(summary.dau_mau_ratio, 100.0);
        // retention cohorts: 2024-01 at 50%, 2024-02 at 0%
        assert_eq!(summary.average_retention_rate, 25.0);
        // churn: free 100, pro 0, enterprise 0
        assert_eq!(summary.average_churn_rate, 33.33);
        assert_eq!(summary.top_features.len(), 3);
        assert_eq!(summary.top_features[0].feature, "dashboard");
    }

    #[test]
    fn test_summary_of_empty_dataset() {
        let ds = Dataset::new(vec![], vec![]).unwrap();
        let summary = ReportSummary::from_metrics(&ds, &sample_metrics(&ds));
        assert_eq!(summary.events_per_user, 0.0);
        assert_eq!(summary.latest_dau, 0);
        assert_eq!(summary.dau_mau_ratio, 0.0);
        assert_eq!(summary.average_retention_rate, 0.0);
        assert!(summary.top_features.is_empty());
    }

    #[test]
    fn test_encoder_stamps_producer() {
        let ds = sample_dataset();
        let encoder = ReportEncoder::with_run_id("run-1".to_string());
        let report = encoder.encode(&ds, day("2024-12-31"), sample_metrics(&ds));
        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.run_id, "run-1");
        assert_eq!(report.as_of_date, day("2024-12-31"));
    }

    #[test]
    fn test_encode_to_json() {
        let ds = sample_dataset();
        let json = ReportEncoder::new()
            .encode_to_json(&ds, day("2024-12-31"), sample_metrics(&ds))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["as_of_date"], "2024-12-31");
        assert_eq!(value["metrics"]["retention"][0]["cohort_month"], "2024-01");
        assert_eq!(value["metrics"]["churn"][0]["plan"], "free");
        assert!(value["producer"]["run_id"].as_str().is_some());
    }
}

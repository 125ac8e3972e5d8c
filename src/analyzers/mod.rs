//! Metric analyzers
//!
//! Each analyzer is a pure function of a [`Dataset`] snapshot and an
//! [`AnalyticsConfig`]. Analyzers never depend on one another, so they can
//! run in any order or side by side on the same snapshot.
//!
//! Grouping is done in memory: every analyzer folds events into ordered
//! bucket accumulators (`BTreeMap`), then derives its rows in a second pass.
//! Output order is therefore fixed by the bucket keys and the explicit
//! tie-break rules of each analyzer, never by hash iteration order.

pub mod activation;
pub mod activity;
pub mod adoption;
pub mod churn;
pub mod cohorts;
pub mod engagement;
pub mod plans;
pub mod retention;
pub mod segmentation;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::MeanAccumulator;
use crate::types::{Event, UserId};

pub use activation::{cohort_activation, ActivationRow, CohortActivationAnalyzer};
pub use activity::{
    daily_active_users, monthly_active_users, ActivityAggregator, ActivitySeries,
    DailyActiveUsers, MonthlyActiveUsers,
};
pub use adoption::{feature_adoption, FeatureAdoptionAnalyzer, FeatureAdoptionRow};
pub use churn::{churn_by_plan, classify_users, ChurnClassifier, ChurnLabel, ChurnRow};
pub use cohorts::{cohort_activity, CohortActivityAnalyzer, CohortActivityRow};
pub use engagement::{engagement_scores, EngagementScore, EngagementScorer};
pub use plans::{plan_distribution, PlanDistributionAnalyzer, PlanShare};
pub use retention::{retention_by_cohort, RetentionAnalyzer, RetentionRow};
pub use segmentation::{
    segment_distribution, user_segments, EngagementLevel, SegmentCount, SegmentationAnalyzer,
    UserSegment,
};

/// A metric computed from a snapshot and a configuration
pub trait Analyzer {
    /// Result rows
    type Output: Serialize;

    /// Stable short name (used for logging and export file names)
    fn name(&self) -> &'static str;

    /// Validate the configuration and compute the metric
    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Self::Output, ComputeError>;
}

/// Count distinct users per bucket key, keys in ascending order
pub(crate) fn distinct_users_by<'a, K, I, F>(events: I, key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    I: IntoIterator<Item = &'a Event>,
    F: Fn(&Event) -> K,
{
    let mut buckets: BTreeMap<K, BTreeSet<UserId>> = BTreeMap::new();
    for event in events {
        buckets.entry(key(event)).or_default().insert(event.user_id);
    }
    buckets
        .into_iter()
        .map(|(k, users)| (k, users.len()))
        .collect()
}

/// Per-user activity accumulated over all of a user's events
#[derive(Debug, Clone, Default)]
pub(crate) struct UserActivity {
    pub total_events: usize,
    pub active_days: BTreeSet<NaiveDate>,
    pub features: BTreeSet<String>,
    pub session_duration: MeanAccumulator,
}

impl UserActivity {
    fn add(&mut self, event: &Event) {
        self.total_events += 1;
        self.active_days.insert(event.day());
        if let Some(feature) = &event.feature {
            if !self.features.contains(feature) {
                self.features.insert(feature.clone());
            }
        }
        self.session_duration.push(event.session_duration);
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.active_days.first().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.active_days.last().copied()
    }
}

/// Activity of every user that has at least one event
pub(crate) fn user_activity(dataset: &Dataset) -> BTreeMap<UserId, UserActivity> {
    let mut activity: BTreeMap<UserId, UserActivity> = BTreeMap::new();
    for event in dataset.events() {
        activity.entry(event.user_id).or_default().add(event);
    }
    activity
}

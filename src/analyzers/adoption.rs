//! Feature adoption
//!
//! Groups events that carry a feature label. Rows are ordered by
//! `total_events` descending, ties broken by feature name ascending.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::Analyzer;
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::{round2, MeanAccumulator};
use crate::types::UserId;

/// Usage of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAdoptionRow {
    pub feature: String,
    pub total_events: usize,
    pub unique_users: usize,
    /// Mean of present session durations (seconds, 2 decimals); `None` when
    /// no event of this feature carries a duration
    pub avg_session_duration: Option<f64>,
    /// Distinct calendar days the feature was used on
    pub days_active: usize,
}

#[derive(Default)]
struct FeatureTally {
    events: usize,
    users: BTreeSet<UserId>,
    days: BTreeSet<NaiveDate>,
    duration: MeanAccumulator,
}

/// Adoption per feature
pub fn feature_adoption(dataset: &Dataset) -> Vec<FeatureAdoptionRow> {
    let mut tallies: BTreeMap<&str, FeatureTally> = BTreeMap::new();
    for event in dataset.events() {
        let Some(feature) = event.feature.as_deref() else {
            continue;
        };
        let tally = tallies.entry(feature).or_default();
        tally.events += 1;
        tally.users.insert(event.user_id);
        tally.days.insert(event.day());
        tally.duration.push(event.session_duration);
    }

    // BTreeMap yields features ascending; the stable sort keeps that order
    // among equal event counts.
    let mut rows: Vec<FeatureAdoptionRow> = tallies
        .into_iter()
        .map(|(feature, tally)| FeatureAdoptionRow {
            feature: feature.to_string(),
            total_events: tally.events,
            unique_users: tally.users.len(),
            avg_session_duration: tally.duration.mean().map(round2),
            days_active: tally.days.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.total_events.cmp(&a.total_events));
    rows
}

/// Analyzer wrapper for [`feature_adoption`]
pub struct FeatureAdoptionAnalyzer;

impl Analyzer for FeatureAdoptionAnalyzer {
    type Output = Vec<FeatureAdoptionRow>;

    fn name(&self) -> &'static str {
        "features"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<FeatureAdoptionRow>, ComputeError> {
        config.validate()?;
        Ok(feature_adoption(dataset))
    }
}

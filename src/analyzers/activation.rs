//! Cohort activation
//!
//! Per signup-month cohort, the share of users with at least one event whose
//! day falls in `[signup_date, signup_date + window]`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::Analyzer;
use crate::calendar::{within_window, YearMonth};
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::percentage;
use crate::types::UserId;

/// Activation of one signup cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRow {
    pub cohort_month: YearMonth,
    pub cohort_size: usize,
    pub active_users: usize,
    /// Percentage, 2 decimals; `0.0` for an empty cohort
    pub activation_rate: f64,
}

/// Activation per signup month, ascending by month
pub fn cohort_activation(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<ActivationRow>, ComputeError> {
    config.validate()?;
    let window = config.activation_window_days;

    let activated: BTreeSet<UserId> = dataset
        .filter_events(|event| {
            dataset
                .profile(event.user_id)
                .is_some_and(|p| within_window(event.day(), p.signup_date, window))
        })
        .map(|event| event.user_id)
        .collect();

    let mut cohorts: BTreeMap<YearMonth, (usize, usize)> = BTreeMap::new();
    for user in dataset.users() {
        let (size, active) = cohorts
            .entry(YearMonth::from_date(user.signup_date))
            .or_default();
        *size += 1;
        if activated.contains(&user.user_id) {
            *active += 1;
        }
    }

    Ok(cohorts
        .into_iter()
        .map(|(cohort_month, (cohort_size, active_users))| ActivationRow {
            cohort_month,
            cohort_size,
            active_users,
            activation_rate: percentage(active_users, cohort_size),
        })
        .collect())
}

/// Analyzer wrapper for [`cohort_activation`]
pub struct CohortActivationAnalyzer;

impl Analyzer for CohortActivationAnalyzer {
    type Output = Vec<ActivationRow>;

    fn name(&self) -> &'static str {
        "activation"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<ActivationRow>, ComputeError> {
        cohort_activation(dataset, config)
    }
}

//! Cohort activity matrix
//!
//! Distinct active users for each (signup month, activity month) pair.

use serde::{Deserialize, Serialize};

use crate::analyzers::{distinct_users_by, Analyzer};
use crate::calendar::YearMonth;
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;

/// Active users of a signup cohort in one activity month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortActivityRow {
    pub cohort_month: YearMonth,
    pub activity_month: YearMonth,
    pub active_users: usize,
}

/// Matrix cells with activity, ordered by cohort month then activity month
pub fn cohort_activity(dataset: &Dataset) -> Vec<CohortActivityRow> {
    // every event resolves to a profile once the snapshot is built
    distinct_users_by(dataset.events(), |e| {
        let cohort = dataset
            .profile(e.user_id)
            .map(|p| YearMonth::from_date(p.signup_date));
        (cohort, YearMonth::from_timestamp(e.timestamp))
    })
    .into_iter()
    .filter_map(|((cohort, activity_month), active_users)| {
        Some(CohortActivityRow {
            cohort_month: cohort?,
            activity_month,
            active_users,
        })
    })
    .collect()
}

/// Analyzer wrapper for [`cohort_activity`]
pub struct CohortActivityAnalyzer;

impl Analyzer for CohortActivityAnalyzer {
    type Output = Vec<CohortActivityRow>;

    fn name(&self) -> &'static str {
        "cohorts"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<CohortActivityRow>, ComputeError> {
        config.validate()?;
        Ok(cohort_activity(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_dataset;

    #[test]
    fn test_sample_matrix() {
        let cells: Vec<(String, String, usize)> = cohort_activity(&sample_dataset())
            .into_iter()
            .map(|r| {
                (
                    r.cohort_month.to_string(),
                    r.activity_month.to_string(),
                    r.active_users,
                )
            })
            .collect();
        assert_eq!(
            cells,
            vec![
                ("2024-01".to_string(), "2024-01".to_string(), 2),
                ("2024-02".to_string(), "2024-02".to_string(), 1),
                ("2024-02".to_string(), "2024-12".to_string(), 1),
            ]
        );
    }
}

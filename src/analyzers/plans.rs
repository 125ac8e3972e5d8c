//! Plan distribution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyzers::Analyzer;
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::percentage;
use crate::types::Plan;

/// Registered users on one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanShare {
    pub plan: Plan,
    pub users: usize,
    /// Percentage of all users, 2 decimals
    pub share: f64,
}

/// User count per plan in plan order; plans with no users are omitted
pub fn plan_distribution(dataset: &Dataset) -> Vec<PlanShare> {
    let mut counts: BTreeMap<Plan, usize> = BTreeMap::new();
    for user in dataset.users() {
        *counts.entry(user.plan).or_default() += 1;
    }
    let total = dataset.user_count();
    counts
        .into_iter()
        .map(|(plan, users)| PlanShare {
            plan,
            users,
            share: percentage(users, total),
        })
        .collect()
}

/// Analyzer wrapper for [`plan_distribution`]
pub struct PlanDistributionAnalyzer;

impl Analyzer for PlanDistributionAnalyzer {
    type Output = Vec<PlanShare>;

    fn name(&self) -> &'static str {
        "plans"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<PlanShare>, ComputeError> {
        config.validate()?;
        Ok(plan_distribution(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_dataset;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_distribution() {
        assert_eq!(
            plan_distribution(&sample_dataset()),
            vec![
                PlanShare {
                    plan: Plan::Free,
                    users: 2,
                    share: 50.0,
                },
                PlanShare {
                    plan: Plan::Pro,
                    users: 1,
                    share: 25.0,
                },
                PlanShare {
                    plan: Plan::Enterprise,
                    users: 1,
                    share: 25.0,
                },
            ]
        );
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(vec![], vec![]).unwrap();
        assert!(plan_distribution(&ds).is_empty());
    }
}

//! Churn classification by plan
//!
//! Only users with at least one event have a last-activity day and take part.
//! A user is churned when `as_of - last_activity` exceeds the threshold
//! (strictly greater).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyzers::{user_activity, Analyzer};
use crate::calendar::day_difference;
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::percentage;
use crate::types::{Plan, UserId};

/// Churn label of a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnLabel {
    pub user_id: UserId,
    pub plan: Plan,
    pub last_activity_date: NaiveDate,
    /// Negative when the last event is after the as-of date
    pub days_since_last_activity: i64,
    pub churned: bool,
}

/// Churn of one plan bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRow {
    pub plan: Plan,
    pub total_users: usize,
    pub churned_users: usize,
    /// Percentage, 2 decimals; `0.0` when no user in the plan has events
    pub churn_rate: f64,
}

/// Label every user that has events, ascending by `user_id`
pub fn classify_users(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<ChurnLabel>, ComputeError> {
    config.validate()?;
    let as_of = config.require_as_of_date()?;
    let threshold = config.churn_threshold_days;

    let mut labels = Vec::new();
    for (user_id, activity) in user_activity(dataset) {
        let (Some(last_activity_date), Some(profile)) =
            (activity.last_day(), dataset.profile(user_id))
        else {
            continue;
        };
        let days_since_last_activity = day_difference(as_of, last_activity_date);
        labels.push(ChurnLabel {
            user_id,
            plan: profile.plan,
            last_activity_date,
            days_since_last_activity,
            churned: days_since_last_activity > threshold,
        });
    }
    Ok(labels)
}

/// Churn per plan, in plan order
///
/// Every plan that has at least one registered user gets a row, even when
/// none of its users has events.
pub fn churn_by_plan(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<ChurnRow>, ComputeError> {
    let labels = classify_users(dataset, config)?;

    let mut buckets: BTreeMap<Plan, (usize, usize)> = dataset
        .users()
        .iter()
        .map(|u| (u.plan, (0, 0)))
        .collect();
    for label in &labels {
        let (total, churned) = buckets.entry(label.plan).or_default();
        *total += 1;
        if label.churned {
            *churned += 1;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(plan, (total_users, churned_users))| ChurnRow {
            plan,
            total_users,
            churned_users,
            churn_rate: percentage(churned_users, total_users),
        })
        .collect())
}

/// Analyzer wrapper for [`churn_by_plan`]
pub struct ChurnClassifier;

impl Analyzer for ChurnClassifier {
    type Output = Vec<ChurnRow>;

    fn name(&self) -> &'static str {
        "churn"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<ChurnRow>, ComputeError> {
        churn_by_plan(dataset, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::fixtures::{config, day, event, sample_dataset, user};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sixty_days_inactive_is_churned() {
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Pro)],
            vec![event(1, 1, "2024-11-01 12:00:00")],
        )
        .unwrap();
        let labels = classify_users(&ds, &config()).unwrap();
        assert_eq!(labels[0].days_since_last_activity, 60);
        assert!(labels[0].churned);

        let rows = churn_by_plan(&ds, &config()).unwrap();
        assert_eq!(
            rows,
            vec![ChurnRow {
                plan: Plan::Pro,
                total_users: 1,
                churned_users: 1,
                churn_rate: 100.0,
            }]
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free)],
            // exactly 30 days before 12-31
            vec![event(1, 1, "2024-12-01 00:00:00")],
        )
        .unwrap();
        let labels = classify_users(&ds, &config()).unwrap();
        assert_eq!(labels[0].days_since_last_activity, 30);
        assert!(!labels[0].churned);
    }

    #[test]
    fn test_sample_by_plan() {
        let rows = churn_by_plan(&sample_dataset(), &config()).unwrap();
        assert_eq!(
            rows,
            vec![
                ChurnRow {
                    plan: Plan::Free,
                    total_users: 2,
                    churned_users: 2,
                    churn_rate: 100.0,
                },
                ChurnRow {
                    plan: Plan::Pro,
                    total_users: 1,
                    churned_users: 0,
                    churn_rate: 0.0,
                },
                // enterprise user has no events: empty bucket, guarded rate
                ChurnRow {
                    plan: Plan::Enterprise,
                    total_users: 0,
                    churned_users: 0,
                    churn_rate: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_last_activity_uses_latest_day() {
        let labels = classify_users(&sample_dataset(), &config()).unwrap();
        let user3 = labels.iter().find(|l| l.user_id == 3).unwrap();
        assert_eq!(user3.last_activity_date, day("2024-12-15"));
        assert_eq!(user3.days_since_last_activity, 16);
    }

    #[test]
    fn test_missing_as_of_date_aborts() {
        let cfg = AnalyticsConfig::default();
        let err = churn_by_plan(&sample_dataset(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::InvalidConfiguration(ConfigError::MissingAsOfDate)
        ));
    }

    #[test]
    fn test_rates_bounded() {
        for row in churn_by_plan(&sample_dataset(), &config()).unwrap() {
            assert!((0.0..=100.0).contains(&row.churn_rate));
            assert!(row.churned_users <= row.total_users);
        }
    }
}

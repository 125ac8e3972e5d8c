//! N-day retention by first-activity cohort
//!
//! A user's first activity day is their earliest event day. The user counts
//! as retained when they have an event on exactly `first + N` days; activity
//! on any other day (N-1, N+1, ...) does not count. Cohorts are the
//! year-month of the first activity day.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analyzers::{user_activity, Analyzer};
use crate::calendar::{add_days, YearMonth};
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::percentage;

/// Retention of one first-activity cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionRow {
    pub cohort_month: YearMonth,
    pub total_users: usize,
    pub retained_users: usize,
    /// Percentage, 2 decimals; `0.0` for an empty cohort
    pub retention_rate: f64,
}

#[derive(Default)]
struct CohortTally {
    total: usize,
    retained: usize,
}

/// Exact-day retention per first-activity month, ascending by month
pub fn retention_by_cohort(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<RetentionRow>, ComputeError> {
    config.validate()?;
    let offset = config.retention_offset_days;

    let mut cohorts: BTreeMap<YearMonth, CohortTally> = BTreeMap::new();
    for activity in user_activity(dataset).values() {
        let Some(first_day) = activity.first_day() else {
            continue;
        };
        let retained = add_days(first_day, offset)
            .map(|target| activity.active_days.contains(&target))
            .unwrap_or(false);

        let tally = cohorts.entry(YearMonth::from_date(first_day)).or_default();
        tally.total += 1;
        if retained {
            tally.retained += 1;
        }
    }

    Ok(cohorts
        .into_iter()
        .map(|(cohort_month, tally)| RetentionRow {
            cohort_month,
            total_users: tally.total,
            retained_users: tally.retained,
            retention_rate: percentage(tally.retained, tally.total),
        })
        .collect())
}

/// Analyzer wrapper for [`retention_by_cohort`]
pub struct RetentionAnalyzer;

impl Analyzer for RetentionAnalyzer {
    type Output = Vec<RetentionRow>;

    fn name(&self) -> &'static str {
        "retention"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<RetentionRow>, ComputeError> {
        retention_by_cohort(dataset, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, event, sample_dataset, user};
    use crate::types::Plan;
    use pretty_assertions::assert_eq;

    fn two_user_dataset() -> Dataset {
        Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free), user(2, "2024-01-01", Plan::Pro)],
            vec![
                event(1, 1, "2024-01-01 10:00:00"),
                event(2, 1, "2024-01-08 10:00:00"),
                event(3, 2, "2024-01-01 11:00:00"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_seven_day_retention() {
        let rows = retention_by_cohort(&two_user_dataset(), &config()).unwrap();
        assert_eq!(
            rows,
            vec![RetentionRow {
                cohort_month: "2024-01".parse().unwrap(),
                total_users: 2,
                retained_users: 1,
                retention_rate: 50.0,
            }]
        );
    }

    #[test]
    fn test_adjacent_days_do_not_count() {
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free)],
            vec![
                event(1, 1, "2024-01-01 10:00:00"),
                event(2, 1, "2024-01-07 10:00:00"),
                event(3, 1, "2024-01-09 10:00:00"),
            ],
        )
        .unwrap();
        let rows = retention_by_cohort(&ds, &config()).unwrap();
        assert_eq!(rows[0].retained_users, 0);
        assert_eq!(rows[0].retention_rate, 0.0);
    }

    #[test]
    fn test_cohort_is_first_activity_month() {
        // first activity on 01-28, return on 02-04 lands in the January cohort
        let ds = Dataset::new(
            vec![user(1, "2023-12-01", Plan::Free)],
            vec![
                event(1, 1, "2024-02-04 10:00:00"),
                event(2, 1, "2024-01-28 10:00:00"),
            ],
        )
        .unwrap();
        let rows = retention_by_cohort(&ds, &config()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cohort_month.to_string(), "2024-01");
        assert_eq!(rows[0].retained_users, 1);
    }

    #[test]
    fn test_custom_offset() {
        let cfg = config().with_retention_offset_days(1);
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free)],
            vec![
                event(1, 1, "2024-01-01 10:00:00"),
                event(2, 1, "2024-01-02 10:00:00"),
            ],
        )
        .unwrap();
        let rows = retention_by_cohort(&ds, &cfg).unwrap();
        assert_eq!(rows[0].retention_rate, 100.0);
    }

    #[test]
    fn test_users_without_events_are_not_in_cohorts() {
        let rows = retention_by_cohort(&sample_dataset(), &config()).unwrap();
        let total: usize = rows.iter().map(|r| r.total_users).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_rates_bounded_and_retained_not_above_total() {
        let rows = retention_by_cohort(&sample_dataset(), &config()).unwrap();
        let retained: usize = rows.iter().map(|r| r.retained_users).sum();
        let total: usize = rows.iter().map(|r| r.total_users).sum();
        assert!(retained <= total);
        for row in &rows {
            assert!((0.0..=100.0).contains(&row.retention_rate));
        }
    }

    #[test]
    fn test_invalid_config_aborts() {
        let cfg = config().with_retention_offset_days(-7);
        assert!(matches!(
            retention_by_cohort(&two_user_dataset(), &cfg),
            Err(ComputeError::InvalidConfiguration(_))
        ));
    }
}

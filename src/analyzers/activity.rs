//! Active users (DAU / MAU)
//!
//! Distinct users with at least one event per calendar day or month. The
//! series is sparse: periods with no events are absent, not zero-filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyzers::{distinct_users_by, Analyzer};
use crate::calendar::YearMonth;
use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::types::Event;

/// Distinct active users on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActiveUsers {
    pub date: NaiveDate,
    pub active_users: usize,
}

/// Distinct active users in one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActiveUsers {
    pub month: YearMonth,
    pub active_users: usize,
}

/// Daily and monthly series together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySeries {
    pub daily: Vec<DailyActiveUsers>,
    pub monthly: Vec<MonthlyActiveUsers>,
}

/// Daily active users, ascending by day
pub fn daily_active_users(dataset: &Dataset) -> Vec<DailyActiveUsers> {
    distinct_users_by(dataset.events(), Event::day)
        .into_iter()
        .map(|(date, active_users)| DailyActiveUsers { date, active_users })
        .collect()
}

/// Monthly active users, ascending by month
pub fn monthly_active_users(dataset: &Dataset) -> Vec<MonthlyActiveUsers> {
    distinct_users_by(dataset.events(), |e| YearMonth::from_timestamp(e.timestamp))
        .into_iter()
        .map(|(month, active_users)| MonthlyActiveUsers {
            month,
            active_users,
        })
        .collect()
}

/// Analyzer producing both active-user series
pub struct ActivityAggregator;

impl Analyzer for ActivityAggregator {
    type Output = ActivitySeries;

    fn name(&self) -> &'static str {
        "activity"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<ActivitySeries, ComputeError> {
        config.validate()?;
        Ok(ActivitySeries {
            daily: daily_active_users(dataset),
            monthly: monthly_active_users(dataset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, day, event, sample_dataset, user};
    use crate::types::Plan;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_daily_active_users_sparse_and_sorted() {
        let ds = sample_dataset();
        let dau = daily_active_users(&ds);
        assert_eq!(
            dau,
            vec![
                DailyActiveUsers {
                    date: day("2024-01-01"),
                    active_users: 2,
                },
                DailyActiveUsers {
                    date: day("2024-01-08"),
                    active_users: 1,
                },
                DailyActiveUsers {
                    date: day("2024-02-12"),
                    active_users: 1,
                },
                DailyActiveUsers {
                    date: day("2024-02-20"),
                    active_users: 1,
                },
                DailyActiveUsers {
                    date: day("2024-12-15"),
                    active_users: 1,
                },
            ]
        );
    }

    #[test]
    fn test_monthly_active_users() {
        let ds = sample_dataset();
        let mau = monthly_active_users(&ds);
        let rendered: Vec<(String, usize)> = mau
            .iter()
            .map(|m| (m.month.to_string(), m.active_users))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("2024-01".to_string(), 2),
                ("2024-02".to_string(), 1),
                ("2024-12".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_duplicate_events_count_once() {
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free)],
            vec![
                event(1, 1, "2024-01-01 08:00:00"),
                event(2, 1, "2024-01-01 09:00:00"),
                event(3, 1, "2024-01-01 23:59:59"),
            ],
        )
        .unwrap();
        assert_eq!(daily_active_users(&ds)[0].active_users, 1);
        assert_eq!(monthly_active_users(&ds)[0].active_users, 1);
    }

    #[test]
    fn test_dau_bounded_by_active_users_and_mau() {
        let ds = sample_dataset();
        let dau = daily_active_users(&ds);
        let mau = monthly_active_users(&ds);
        let total_active = ds.active_user_count();

        for point in &dau {
            assert!(point.active_users <= total_active);
            let month = YearMonth::from_date(point.date);
            let monthly = mau.iter().find(|m| m.month == month).unwrap();
            assert!(monthly.active_users >= point.active_users);
        }
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::new(vec![], vec![]).unwrap();
        assert!(daily_active_users(&ds).is_empty());
        assert!(monthly_active_users(&ds).is_empty());
    }

    #[test]
    fn test_analyzer_is_idempotent() {
        let ds = sample_dataset();
        let first = ActivityAggregator.analyze(&ds, &config()).unwrap();
        let second = ActivityAggregator.analyze(&ds, &config()).unwrap();
        assert_eq!(first, second);
    }
}

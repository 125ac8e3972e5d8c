//! Test fixtures for building small snapshots

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::AnalyticsConfig;
use crate::dataset::Dataset;
use crate::schema::parse_timestamp;
use crate::types::{Event, EventId, Plan, User, UserId};

pub fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

pub fn ts(value: &str) -> NaiveDateTime {
    parse_timestamp(value).unwrap()
}

pub fn user(user_id: UserId, signup: &str, plan: Plan) -> User {
    User::new(user_id, day(signup), plan)
}

pub fn event(event_id: EventId, user_id: UserId, at: &str) -> Event {
    Event::new(event_id, user_id, ts(at))
}

pub fn config() -> AnalyticsConfig {
    AnalyticsConfig::new(day("2024-12-31"))
}

/// Snapshot shared by analyzer tests:
///
/// - user 1 (free, signup 2024-01-01): active 01-01, 01-08 (retained), 01-08 again
/// - user 2 (free, signup 2024-01-01): active 01-01 only
/// - user 3 (pro, signup 2024-02-10): active 02-12, 02-20, 12-15
/// - user 4 (enterprise, signup 2024-02-20): no events
pub fn sample_dataset() -> Dataset {
    let users = vec![
        user(1, "2024-01-01", Plan::Free).with_country("US"),
        user(2, "2024-01-01", Plan::Free),
        user(3, "2024-02-10", Plan::Pro).with_country("DE"),
        user(4, "2024-02-20", Plan::Enterprise),
    ];
    let events = vec![
        event(1, 1, "2024-01-01 09:00:00")
            .with_feature("dashboard")
            .with_session_duration(120.0),
        event(2, 1, "2024-01-08 10:00:00")
            .with_feature("reports")
            .with_session_duration(300.0),
        event(3, 1, "2024-01-08 17:30:00").with_feature("dashboard"),
        event(4, 2, "2024-01-01 12:00:00")
            .with_feature("dashboard")
            .with_session_duration(60.0),
        event(5, 3, "2024-02-12 08:00:00")
            .with_feature("reports")
            .with_session_duration(600.0),
        event(6, 3, "2024-02-20 08:00:00").with_event_type("login"),
        event(7, 3, "2024-12-15 08:00:00")
            .with_feature("export")
            .with_session_duration(240.0),
    ];
    Dataset::new(users, events).unwrap()
}

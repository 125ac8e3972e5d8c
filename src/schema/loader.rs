//! Snapshot loading
//!
//! Parses raw user/event exports (NDJSON or JSON array), drops repeated ids
//! the same way the source export cleaning does, and builds a validated
//! [`Dataset`].

use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

use crate::dataset::Dataset;
use crate::error::{ComputeError, DataIntegrityError, RecordKind};
use crate::schema::records::{RawEvent, RawUser};
use crate::types::{Event, User};

/// Loader for raw exports into a [`Dataset`]
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Parse a JSON string containing an array of records
    pub fn parse_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, ComputeError> {
        let records: Vec<T> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON), one record per line
    pub fn parse_ndjson<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, ComputeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert raw users, keeping the first occurrence of each `user_id`
    pub fn build_users(raw: &[RawUser]) -> Result<Vec<User>, DataIntegrityError> {
        let mut seen = BTreeSet::new();
        let mut users = Vec::with_capacity(raw.len());
        for (index, record) in raw.iter().enumerate() {
            let user = record.to_user(index)?;
            if seen.insert(user.user_id) {
                users.push(user);
            }
        }
        let dropped = raw.len() - users.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped user records with repeated user_id");
        }
        Ok(users)
    }

    /// Convert raw events, keeping the first occurrence of each `event_id`
    pub fn build_events(raw: &[RawEvent]) -> Result<Vec<Event>, DataIntegrityError> {
        let mut seen = BTreeSet::new();
        let mut events = Vec::with_capacity(raw.len());
        for (index, record) in raw.iter().enumerate() {
            let event = record.to_event(index)?;
            if seen.insert(event.event_id) {
                events.push(event);
            }
        }
        let dropped = raw.len() - events.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped event records with repeated event_id");
        }
        Ok(events)
    }

    /// Build a validated snapshot from raw records
    pub fn build_dataset(users: &[RawUser], events: &[RawEvent]) -> Result<Dataset, ComputeError> {
        let users = Self::build_users(users)?;
        let events = Self::build_events(events)?;
        Ok(Dataset::new(users, events)?)
    }

    /// Check every record and collect all integrity problems
    ///
    /// Unlike [`build_dataset`](Self::build_dataset) this does not stop at
    /// the first problem. Repeated ids are counted, not reported as issues,
    /// since loading drops them.
    pub fn validate_records(users: &[RawUser], events: &[RawEvent]) -> ValidationReport {
        let mut issues = Vec::new();
        let mut user_ids = BTreeSet::new();
        let mut duplicate_users = 0;

        for (index, record) in users.iter().enumerate() {
            match record.to_user(index) {
                Ok(user) => {
                    if !user_ids.insert(user.user_id) {
                        duplicate_users += 1;
                    }
                }
                Err(error) => issues.push(RecordIssue {
                    record: RecordKind::User,
                    index,
                    id: record.user_id,
                    error,
                }),
            }
        }

        let mut event_ids = BTreeSet::new();
        let mut duplicate_events = 0;
        for (index, record) in events.iter().enumerate() {
            let checked = record.to_event(index).and_then(|event| {
                if user_ids.contains(&event.user_id) {
                    Ok(event)
                } else {
                    Err(DataIntegrityError::DanglingUserReference {
                        event_id: event.event_id,
                        user_id: event.user_id,
                    })
                }
            });
            match checked {
                Ok(event) => {
                    if !event_ids.insert(event.event_id) {
                        duplicate_events += 1;
                    }
                }
                Err(error) => issues.push(RecordIssue {
                    record: RecordKind::Event,
                    index,
                    id: record.event_id,
                    error,
                }),
            }
        }

        ValidationReport {
            total_users: users.len(),
            total_events: events.len(),
            duplicate_users,
            duplicate_events,
            issues,
        }
    }
}

/// A single record that failed validation
#[derive(Debug, Clone)]
pub struct RecordIssue {
    pub record: RecordKind,
    pub index: usize,
    /// The record's own id, when present
    pub id: Option<u64>,
    pub error: DataIntegrityError,
}

/// Result of validating a batch of raw records
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub total_users: usize,
    pub total_events: usize,
    pub duplicate_users: usize,
    pub duplicate_events: usize,
    pub issues: Vec<RecordIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS_NDJSON: &str = r#"
{"user_id": 1, "signup_date": "2024-01-01", "country": "US", "plan": "Free"}
{"user_id": 2, "signup_date": "2024-01-03", "plan": "Enterprise"}
{"user_id": 2, "signup_date": "2024-01-04", "plan": "Pro"}
"#;

    const EVENTS_JSON: &str = r#"[
        {"event_id": 1, "user_id": 1, "event_type": "click", "feature": "search",
         "timestamp": "2024-01-01 10:00:00", "session_duration": 30.5},
        {"event_id": 2, "user_id": 2, "feature": null, "timestamp": "2024-01-03T11:00:00"},
        {"event_id": 2, "user_id": 2, "timestamp": "2024-01-05T11:00:00"}
    ]"#;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let users: Vec<RawUser> = SnapshotLoader::parse_ndjson(USERS_NDJSON).unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].country.as_deref(), Some("US"));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let err = SnapshotLoader::parse_ndjson::<RawUser>("{\"user_id\": 1}\nnot json")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_build_dataset_drops_repeated_ids() {
        let users: Vec<RawUser> = SnapshotLoader::parse_ndjson(USERS_NDJSON).unwrap();
        let events: Vec<RawEvent> = SnapshotLoader::parse_array(EVENTS_JSON).unwrap();
        let ds = SnapshotLoader::build_dataset(&users, &events).unwrap();

        assert_eq!(ds.user_count(), 2);
        assert_eq!(ds.event_count(), 2);
        // first occurrence wins
        assert_eq!(ds.profile(2).unwrap().plan, crate::types::Plan::Enterprise);
    }

    #[test]
    fn test_build_dataset_rejects_dangling_user() {
        let users: Vec<RawUser> = SnapshotLoader::parse_ndjson(USERS_NDJSON).unwrap();
        let events: Vec<RawEvent> = SnapshotLoader::parse_array(
            r#"[{"event_id": 9, "user_id": 42, "timestamp": "2024-01-01"}]"#,
        )
        .unwrap();
        let err = SnapshotLoader::build_dataset(&users, &events).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::DataIntegrity(DataIntegrityError::DanglingUserReference {
                event_id: 9,
                user_id: 42
            })
        ));
    }

    #[test]
    fn test_validate_records_collects_all_issues() {
        let users: Vec<RawUser> = SnapshotLoader::parse_array(
            r#"[
                {"user_id": 1, "signup_date": "2024-01-01", "plan": "free"},
                {"user_id": 2, "plan": "pro"},
                {"user_id": 1, "signup_date": "2024-01-01", "plan": "free"}
            ]"#,
        )
        .unwrap();
        let events: Vec<RawEvent> = SnapshotLoader::parse_array(
            r#"[
                {"event_id": 1, "user_id": 1, "timestamp": "2024-01-01"},
                {"event_id": 2, "user_id": 2, "timestamp": "2024-01-01"},
                {"event_id": 3, "user_id": 1},
                {"event_id": 4, "user_id": 1, "timestamp": "2024-01-02", "session_duration": -3}
            ]"#,
        )
        .unwrap();

        let report = SnapshotLoader::validate_records(&users, &events);
        assert!(!report.is_valid());
        assert_eq!(report.duplicate_users, 1);
        assert_eq!(report.issues.len(), 4);
        // user 2 failed to load, so its event dangles
        assert!(matches!(
            report.issues[1].error,
            DataIntegrityError::DanglingUserReference { user_id: 2, .. }
        ));
    }
}

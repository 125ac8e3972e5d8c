//! Error types for Pulse Metrics

use thiserror::Error;

use crate::types::{EventId, UserId};

/// Errors that can occur while loading a snapshot or computing metrics
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// Kind of record a load-time error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Event,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::User => f.write_str("user"),
            RecordKind::Event => f.write_str("event"),
        }
    }
}

/// A snapshot cannot be built because the input violates a referential or
/// required-field invariant. Fatal for the whole snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("{record} record at index {index} is missing required field `{field}`")]
    MissingField {
        record: RecordKind,
        index: usize,
        field: &'static str,
    },

    #[error("event {event_id} references unknown user {user_id}")]
    DanglingUserReference { event_id: EventId, user_id: UserId },

    #[error("duplicate user_id {0}")]
    DuplicateUser(UserId),

    #[error("duplicate event_id {0}")]
    DuplicateEvent(EventId),

    #[error("event {event_id} has invalid session_duration {value}")]
    InvalidSessionDuration { event_id: EventId, value: f64 },

    #[error("{record} record at index {index} has unparseable timestamp `{value}`")]
    InvalidTimestamp {
        record: RecordKind,
        index: usize,
        value: String,
    },

    #[error("user record at index {index} has unparseable signup_date `{value}`")]
    InvalidDate { index: usize, value: String },

    #[error("user record at index {index} has unknown plan `{value}`")]
    UnknownPlan { index: usize, value: String },
}

/// A configuration value is out of its domain. Raised before any analyzer runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("as_of_date is required")]
    MissingAsOfDate,

    #[error("{option} must be non-negative, got {value}")]
    NegativeDays { option: &'static str, value: i64 },

    #[error("engagement_top_n must be at least 1 (use null for an unbounded ranking)")]
    ZeroTopN,

    #[error("engagement weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("segment thresholds must satisfy medium ({medium}) < high ({high})")]
    InvalidSegmentThresholds { medium: usize, high: usize },
}

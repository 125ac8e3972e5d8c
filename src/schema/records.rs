//! Raw input record shapes
//!
//! Raw records mirror the tabular users/events exports one-to-one. Every
//! field is optional at this layer so that a missing required value surfaces
//! as a [`DataIntegrityError`] naming the field, rather than as an opaque
//! deserialization failure.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{DataIntegrityError, RecordKind};
use crate::types::{Event, EventId, Plan, User, UserId};

/// Accepted naive timestamp layouts, tried in order after RFC 3339
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only layout
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A user row as exported by the source system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    pub user_id: Option<UserId>,
    pub signup_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub plan: Option<String>,
}

impl RawUser {
    /// Convert into a typed [`User`], checking required fields
    pub fn to_user(&self, index: usize) -> Result<User, DataIntegrityError> {
        let user_id = self.user_id.ok_or(DataIntegrityError::MissingField {
            record: RecordKind::User,
            index,
            field: "user_id",
        })?;

        let raw_date = non_blank(self.signup_date.as_deref()).ok_or(
            DataIntegrityError::MissingField {
                record: RecordKind::User,
                index,
                field: "signup_date",
            },
        )?;
        let signup_date = parse_date(raw_date).ok_or_else(|| DataIntegrityError::InvalidDate {
            index,
            value: raw_date.to_string(),
        })?;

        let raw_plan = non_blank(self.plan.as_deref()).ok_or(DataIntegrityError::MissingField {
            record: RecordKind::User,
            index,
            field: "plan",
        })?;
        let plan: Plan = raw_plan
            .parse()
            .map_err(|_| DataIntegrityError::UnknownPlan {
                index,
                value: raw_plan.to_string(),
            })?;

        Ok(User {
            user_id,
            signup_date,
            country: non_blank(self.country.as_deref()).map(str::to_string),
            plan,
        })
    }
}

/// An event row as exported by the source system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_id: Option<EventId>,
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<f64>,
}

impl RawEvent {
    /// Convert into a typed [`Event`], checking required fields and the
    /// session duration domain. User references are checked by the dataset.
    pub fn to_event(&self, index: usize) -> Result<Event, DataIntegrityError> {
        let event_id = self.event_id.ok_or(DataIntegrityError::MissingField {
            record: RecordKind::Event,
            index,
            field: "event_id",
        })?;
        let user_id = self.user_id.ok_or(DataIntegrityError::MissingField {
            record: RecordKind::Event,
            index,
            field: "user_id",
        })?;

        let raw_ts = non_blank(self.timestamp.as_deref()).ok_or(
            DataIntegrityError::MissingField {
                record: RecordKind::Event,
                index,
                field: "timestamp",
            },
        )?;
        let timestamp =
            parse_timestamp(raw_ts).ok_or_else(|| DataIntegrityError::InvalidTimestamp {
                record: RecordKind::Event,
                index,
                value: raw_ts.to_string(),
            })?;

        if let Some(value) = self.session_duration {
            if !value.is_finite() || value < 0.0 {
                return Err(DataIntegrityError::InvalidSessionDuration { event_id, value });
            }
        }

        Ok(Event {
            event_id,
            user_id,
            event_type: non_blank(self.event_type.as_deref()).map(str::to_string),
            feature: non_blank(self.feature.as_deref()).map(str::to_string),
            timestamp,
            session_duration: self.session_duration,
        })
    }
}

/// Parse a timestamp in any accepted layout
///
/// RFC 3339 values carrying an offset are converted to UTC; naive values are
/// taken as-is; a bare date means midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a calendar date; timestamps are accepted and truncated
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(value).map(crate::calendar::truncate_to_day))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

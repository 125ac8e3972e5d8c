//! Core record types
//!
//! The engine works over two entities: users and their timestamped events.
//! Both are immutable once a [`Dataset`](crate::dataset::Dataset) snapshot has
//! been built from them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier
pub type UserId = u64;

/// Event identifier
pub type EventId = u64;

/// Subscription plan of a user
///
/// Ordering is Free < Pro < Enterprise, which is also the order plan buckets
/// are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[serde(alias = "Free", alias = "FREE")]
    Free,
    #[serde(alias = "Pro", alias = "PRO")]
    Pro,
    #[serde(alias = "Enterprise", alias = "ENTERPRISE")]
    Enterprise,
}

impl Plan {
    /// All plans in reporting order
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Pro, Plan::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    /// Case-insensitive parse of a plan name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(other.to_string()),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub user_id: UserId,
    /// Calendar date of signup
    pub signup_date: NaiveDate,
    /// Optional short country code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Subscription plan
    pub plan: Plan,
}

impl User {
    pub fn new(user_id: UserId, signup_date: NaiveDate, plan: Plan) -> Self {
        Self {
            user_id,
            signup_date,
            country: None,
            plan,
        }
    }

    /// Set the country code
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// A single product event emitted by a user
///
/// `timestamp` is assumed to already be normalized to one time zone; the
/// engine never converts zones per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub event_id: EventId,
    /// Owning user, must resolve to a loaded [`User`]
    pub user_id: UserId,
    /// Optional event label (e.g. "click", "page_view")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Feature the event was emitted from; `None` means no feature context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    /// Event time
    pub timestamp: NaiveDateTime,
    /// Session duration in seconds, non-negative when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<f64>,
}

impl Event {
    pub fn new(event_id: EventId, user_id: UserId, timestamp: NaiveDateTime) -> Self {
        Self {
            event_id,
            user_id,
            event_type: None,
            feature: None,
            timestamp,
            session_duration: None,
        }
    }

    /// Set the event type label
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Set the feature label
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Set the session duration (seconds)
    pub fn with_session_duration(mut self, seconds: f64) -> Self {
        self.session_duration = Some(seconds);
        self
    }

    /// Calendar day of the event
    pub fn day(&self) -> NaiveDate {
        crate::calendar::truncate_to_day(self.timestamp)
    }
}

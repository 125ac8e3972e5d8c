//! Analytics configuration
//!
//! One [`AnalyticsConfig`] is passed to every analyzer. All options except
//! `as_of_date` have defaults; validation runs before any computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, ConfigError};

/// Default exact-day retention offset
pub const DEFAULT_RETENTION_OFFSET_DAYS: i64 = 7;

/// Default inactivity cutoff for churn
pub const DEFAULT_CHURN_THRESHOLD_DAYS: i64 = 30;

/// Default inclusive activation window after signup
pub const DEFAULT_ACTIVATION_WINDOW_DAYS: i64 = 7;

/// Default cap on engagement ranking rows
pub const DEFAULT_ENGAGEMENT_TOP_N: usize = 100;

/// Weight of each event in the engagement score
pub const EVENT_WEIGHT: f64 = 0.3;

/// Weight of each distinct active day in the engagement score
pub const ACTIVE_DAY_WEIGHT: f64 = 2.0;

/// Weight of each distinct feature used in the engagement score
pub const FEATURE_WEIGHT: f64 = 5.0;

/// Weight of each minute of mean session duration in the engagement score
pub const SESSION_MINUTE_WEIGHT: f64 = 0.5;

/// Users with more events than this are "high" engagement
pub const DEFAULT_HIGH_MIN_EVENTS: usize = 100;

/// Users with more events than this (and not high) are "medium" engagement
pub const DEFAULT_MEDIUM_MIN_EVENTS: usize = 20;

/// Engagement scoring coefficients
///
/// ```text
/// score = events * events_weight
///       + active_days * active_days_weight
///       + features * features_weight
///       + (mean_session_seconds / 60) * session_minutes_weight
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngagementWeights {
    pub events: f64,
    pub active_days: f64,
    pub features: f64,
    pub session_minutes: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            events: EVENT_WEIGHT,
            active_days: ACTIVE_DAY_WEIGHT,
            features: FEATURE_WEIGHT,
            session_minutes: SESSION_MINUTE_WEIGHT,
        }
    }
}

impl EngagementWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("events", self.events),
            ("active_days", self.active_days),
            ("features", self.features),
            ("session_minutes", self.session_minutes),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Event-count cutoffs for user segmentation (both exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentThresholds {
    pub high_min_events: usize,
    pub medium_min_events: usize,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            high_min_events: DEFAULT_HIGH_MIN_EVENTS,
            medium_min_events: DEFAULT_MEDIUM_MIN_EVENTS,
        }
    }
}

/// Configuration shared by all analyzers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Exact-day offset used for retention
    pub retention_offset_days: i64,
    /// Inactivity cutoff for churn (strictly greater than)
    pub churn_threshold_days: i64,
    /// Reference "now" for churn; required
    pub as_of_date: Option<NaiveDate>,
    /// Inclusive window after signup for activation
    pub activation_window_days: i64,
    /// Cap on engagement rows; `None` returns the full ranking
    pub engagement_top_n: Option<usize>,
    /// Engagement scoring coefficients
    pub engagement_weights: EngagementWeights,
    /// Segmentation cutoffs
    pub segment_thresholds: SegmentThresholds,
}

impl Default for AnalyticsConfig {
    /// Defaults for every option; `as_of_date` stays unset and must be
    /// provided before validation succeeds.
    fn default() -> Self {
        Self {
            retention_offset_days: DEFAULT_RETENTION_OFFSET_DAYS,
            churn_threshold_days: DEFAULT_CHURN_THRESHOLD_DAYS,
            as_of_date: None,
            activation_window_days: DEFAULT_ACTIVATION_WINDOW_DAYS,
            engagement_top_n: Some(DEFAULT_ENGAGEMENT_TOP_N),
            engagement_weights: EngagementWeights::default(),
            segment_thresholds: SegmentThresholds::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Default configuration with the given as-of date
    pub fn new(as_of_date: NaiveDate) -> Self {
        Self {
            as_of_date: Some(as_of_date),
            ..Self::default()
        }
    }

    /// Parse from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_as_of_date(mut self, as_of_date: NaiveDate) -> Self {
        self.as_of_date = Some(as_of_date);
        self
    }

    pub fn with_retention_offset_days(mut self, days: i64) -> Self {
        self.retention_offset_days = days;
        self
    }

    pub fn with_churn_threshold_days(mut self, days: i64) -> Self {
        self.churn_threshold_days = days;
        self
    }

    pub fn with_activation_window_days(mut self, days: i64) -> Self {
        self.activation_window_days = days;
        self
    }

    /// Cap the engagement ranking; `None` for the full ranking
    pub fn with_engagement_top_n(mut self, top_n: Option<usize>) -> Self {
        self.engagement_top_n = top_n;
        self
    }

    pub fn with_engagement_weights(mut self, weights: EngagementWeights) -> Self {
        self.engagement_weights = weights;
        self
    }

    pub fn with_segment_thresholds(mut self, thresholds: SegmentThresholds) -> Self {
        self.segment_thresholds = thresholds;
        self
    }

    /// The as-of date, or [`ConfigError::MissingAsOfDate`]
    pub fn require_as_of_date(&self) -> Result<NaiveDate, ConfigError> {
        self.as_of_date.ok_or(ConfigError::MissingAsOfDate)
    }

    /// Check every option is in its domain
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_as_of_date()?;

        let day_options = [
            ("retention_offset_days", self.retention_offset_days),
            ("churn_threshold_days", self.churn_threshold_days),
            ("activation_window_days", self.activation_window_days),
        ];
        for (option, value) in day_options {
            if value < 0 {
                return Err(ConfigError::NegativeDays { option, value });
            }
        }

        if self.engagement_top_n == Some(0) {
            return Err(ConfigError::ZeroTopN);
        }

        self.engagement_weights.validate()?;

        let SegmentThresholds {
            high_min_events: high,
            medium_min_events: medium,
        } = self.segment_thresholds;
        if medium >= high {
            return Err(ConfigError::InvalidSegmentThresholds { medium, high });
        }

        Ok(())
    }
}

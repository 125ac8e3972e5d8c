//! User segmentation by engagement level
//!
//! Every registered user is segmented, including users with no events (who
//! land in the low segment with zero counts).

use serde::{Deserialize, Serialize};

use crate::analyzers::{user_activity, Analyzer, UserActivity};
use crate::config::{AnalyticsConfig, SegmentThresholds};
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::round2;
use crate::types::{Plan, UserId};

/// Engagement level by event volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    /// Levels in reporting order
    pub const ALL: [EngagementLevel; 3] = [
        EngagementLevel::High,
        EngagementLevel::Medium,
        EngagementLevel::Low,
    ];

    /// Level for an event count (both cutoffs exclusive)
    pub fn classify(total_events: usize, thresholds: &SegmentThresholds) -> Self {
        if total_events > thresholds.high_min_events {
            EngagementLevel::High
        } else if total_events > thresholds.medium_min_events {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::High => "high",
            EngagementLevel::Medium => "medium",
            EngagementLevel::Low => "low",
        }
    }
}

/// Segment of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSegment {
    pub user_id: UserId,
    pub plan: Plan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub total_events: usize,
    pub active_days: usize,
    pub features_used: usize,
    pub avg_session_duration: Option<f64>,
    pub engagement_level: EngagementLevel,
}

/// Number of users in one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentCount {
    pub level: EngagementLevel,
    pub users: usize,
}

/// Segment every user, ascending by `user_id`
pub fn user_segments(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<UserSegment>, ComputeError> {
    config.validate()?;
    let thresholds = &config.segment_thresholds;
    let mut activity = user_activity(dataset);

    Ok(dataset
        .users()
        .iter()
        .map(|user| {
            let stats = activity.remove(&user.user_id).unwrap_or_default();
            segment(user.user_id, user.plan, user.country.clone(), &stats, thresholds)
        })
        .collect())
}

fn segment(
    user_id: UserId,
    plan: Plan,
    country: Option<String>,
    stats: &UserActivity,
    thresholds: &SegmentThresholds,
) -> UserSegment {
    UserSegment {
        user_id,
        plan,
        country,
        total_events: stats.total_events,
        active_days: stats.active_days.len(),
        features_used: stats.features.len(),
        avg_session_duration: stats.session_duration.mean().map(round2),
        engagement_level: EngagementLevel::classify(stats.total_events, thresholds),
    }
}

/// Users per level in High, Medium, Low order; empty levels are kept
pub fn segment_distribution(segments: &[UserSegment]) -> Vec<SegmentCount> {
    EngagementLevel::ALL
        .iter()
        .map(|&level| SegmentCount {
            level,
            users: segments
                .iter()
                .filter(|s| s.engagement_level == level)
                .count(),
        })
        .collect()
}

/// Analyzer wrapper for [`user_segments`]
pub struct SegmentationAnalyzer;

impl Analyzer for SegmentationAnalyzer {
    type Output = Vec<UserSegment>;

    fn name(&self) -> &'static str {
        "segments"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<UserSegment>, ComputeError> {
        user_segments(dataset, config)
    }
}

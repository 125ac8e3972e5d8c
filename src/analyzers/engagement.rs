//! Engagement scoring
//!
//! Per-user weighted composite of event volume, distinct active days,
//! feature breadth and mean session length:
//!
//! ```text
//! score = round2(events * 0.3 + active_days * 2 + features * 5
//!                + (mean_session_seconds / 60) * 0.5)
//! ```
//!
//! Coefficients come from [`EngagementWeights`](crate::config::EngagementWeights).
//! A user with no session durations gets no session term.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::analyzers::{user_activity, Analyzer, UserActivity};
use crate::config::{AnalyticsConfig, EngagementWeights};
use crate::dataset::Dataset;
use crate::error::ComputeError;
use crate::stats::round2;
use crate::types::{Plan, UserId};

/// Engagement of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementScore {
    pub user_id: UserId,
    pub plan: Plan,
    pub total_events: usize,
    pub active_days: usize,
    pub features_used: usize,
    /// Mean of present session durations (seconds, 2 decimals)
    pub avg_session_duration: Option<f64>,
    pub score: f64,
}

fn score(activity: &UserActivity, weights: &EngagementWeights) -> f64 {
    let session_term = activity
        .session_duration
        .mean()
        .map_or(0.0, |seconds| seconds / 60.0 * weights.session_minutes);
    round2(
        activity.total_events as f64 * weights.events
            + activity.active_days.len() as f64 * weights.active_days
            + activity.features.len() as f64 * weights.features
            + session_term,
    )
}

/// Ranking order: score descending, then `user_id` ascending
fn ranking(a: &EngagementScore, b: &EngagementScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.user_id.cmp(&b.user_id))
}

/// Score every user with events, highest first, capped at
/// `engagement_top_n` rows (uncapped when `None`)
pub fn engagement_scores(
    dataset: &Dataset,
    config: &AnalyticsConfig,
) -> Result<Vec<EngagementScore>, ComputeError> {
    config.validate()?;
    let weights = &config.engagement_weights;

    let mut scores: Vec<EngagementScore> = user_activity(dataset)
        .into_iter()
        .filter_map(|(user_id, activity)| {
            let profile = dataset.profile(user_id)?;
            Some(EngagementScore {
                user_id,
                plan: profile.plan,
                total_events: activity.total_events,
                active_days: activity.active_days.len(),
                features_used: activity.features.len(),
                avg_session_duration: activity.session_duration.mean().map(round2),
                score: score(&activity, weights),
            })
        })
        .collect();

    scores.sort_by(ranking);
    if let Some(top_n) = config.engagement_top_n {
        scores.truncate(top_n);
    }
    Ok(scores)
}

/// Analyzer wrapper for [`engagement_scores`]
pub struct EngagementScorer;

impl Analyzer for EngagementScorer {
    type Output = Vec<EngagementScore>;

    fn name(&self) -> &'static str {
        "engagement"
    }

    fn analyze(
        &self,
        dataset: &Dataset,
        config: &AnalyticsConfig,
    ) -> Result<Vec<EngagementScore>, ComputeError> {
        engagement_scores(dataset, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{config, event, sample_dataset, user};

    #[test]
    fn test_sample_scores() {
        let scores = engagement_scores(&sample_dataset(), &config()).unwrap();
        let ranked: Vec<(UserId, f64)> = scores.iter().map(|s| (s.user_id, s.score)).collect();
        // u3: 3*0.3 + 3*2 + 2*5 + 7min*0.5 = 20.4
        // u1: 3*0.3 + 2*2 + 2*5 + 3.5min*0.5 = 16.65
        // u2: 1*0.3 + 1*2 + 1*5 + 1min*0.5 = 7.8
        assert_eq!(ranked, vec![(3, 20.4), (1, 16.65), (2, 7.8)]);
        assert_eq!(scores[0].plan, Plan::Pro);
        assert_eq!(scores[0].avg_session_duration, Some(420.0));
    }

    #[test]
    fn test_missing_durations_contribute_zero() {
        let ds = Dataset::new(
            vec![user(1, "2024-01-01", Plan::Free)],
            vec![event(1, 1, "2024-01-01 10:00:00")],
        )
        .unwrap();
        let scores = engagement_scores(&ds, &config()).unwrap();
        assert_eq!(scores[0].avg_session_duration, None);
        assert_eq!(scores[0].score, 2.3);
    }

    #[test]
    fn test_top_n_cap_and_unbounded() {
        let users = (1..=5).map(|id| user(id, "2024-01-01", Plan::Free)).collect();
        let events = (1..=5)
            .map(|id| event(id, id, "2024-01-01 10:00:00"))
            .collect();
        let ds = Dataset::new(users, events).unwrap();

        let capped = engagement_scores(&ds, &config().with_engagement_top_n(Some(3))).unwrap();
        assert_eq!(capped.len(), 3);
        // equal scores fall back to user_id order
        let ids: Vec<_> = capped.iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let all = engagement_scores(&ds, &config().with_engagement_top_n(None)).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_scores_non_increasing() {
        let scores = engagement_scores(&sample_dataset(), &config()).unwrap();
        assert!(scores.len() <= 100);
        for pair in scores.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_custom_weights() {
        let weights = EngagementWeights {
            events: 1.0,
            active_days: 0.0,
            features: 0.0,
            session_minutes: 0.0,
        };
        let cfg = config().with_engagement_weights(weights);
        let scores = engagement_scores(&sample_dataset(), &cfg).unwrap();
        let ranked: Vec<(UserId, f64)> = scores.iter().map(|s| (s.user_id, s.score)).collect();
        assert_eq!(ranked, vec![(1, 3.0), (3, 3.0), (2, 1.0)]);
    }
}

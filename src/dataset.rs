//! Dataset snapshot
//!
//! A [`Dataset`] is the read-only view every analyzer queries. It is built
//! once per run, validated on construction, and never mutated afterwards,
//! so analyzers running side by side all observe the same data.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::calendar::truncate_to_day;
use crate::error::DataIntegrityError;
use crate::types::{Event, Plan, User, UserId};

/// Indexed attributes of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserProfile {
    pub signup_date: NaiveDate,
    pub plan: Plan,
}

/// Immutable snapshot of users and their events
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Users ordered by `user_id`
    users: Vec<User>,
    /// Events ordered by `(timestamp, event_id)`
    events: Vec<Event>,
    profiles: BTreeMap<UserId, UserProfile>,
}

impl Dataset {
    /// Build a snapshot, failing fast on any integrity violation
    ///
    /// Rejects duplicate user or event ids, events whose `user_id` does not
    /// resolve to a user, and negative or non-finite session durations.
    pub fn new(mut users: Vec<User>, mut events: Vec<Event>) -> Result<Self, DataIntegrityError> {
        let mut profiles = BTreeMap::new();
        for user in &users {
            let profile = UserProfile {
                signup_date: user.signup_date,
                plan: user.plan,
            };
            if profiles.insert(user.user_id, profile).is_some() {
                return Err(DataIntegrityError::DuplicateUser(user.user_id));
            }
        }

        let mut seen_events = BTreeSet::new();
        for event in &events {
            if !seen_events.insert(event.event_id) {
                return Err(DataIntegrityError::DuplicateEvent(event.event_id));
            }
            if !profiles.contains_key(&event.user_id) {
                return Err(DataIntegrityError::DanglingUserReference {
                    event_id: event.event_id,
                    user_id: event.user_id,
                });
            }
            if let Some(value) = event.session_duration {
                if !value.is_finite() || value < 0.0 {
                    return Err(DataIntegrityError::InvalidSessionDuration {
                        event_id: event.event_id,
                        value,
                    });
                }
            }
        }

        users.sort_by_key(|u| u.user_id);
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.event_id.cmp(&b.event_id))
        });

        tracing::debug!(
            users = users.len(),
            events = events.len(),
            "dataset snapshot built"
        );

        Ok(Self {
            users,
            events,
            profiles,
        })
    }

    /// All users, ordered by `user_id`
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// All events, ordered by timestamp then `event_id`
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Signup date and plan of a user
    pub fn profile(&self, user_id: UserId) -> Option<&UserProfile> {
        self.profiles.get(&user_id)
    }

    /// Index from `user_id` to signup date and plan
    pub fn profiles(&self) -> &BTreeMap<UserId, UserProfile> {
        &self.profiles
    }

    /// Events matching an arbitrary predicate
    pub fn filter_events<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Event> + 'a
    where
        P: Fn(&Event) -> bool + 'a,
    {
        self.events.iter().filter(move |e| predicate(e))
    }

    /// Events whose calendar day falls in `[start, end]`
    pub fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &Event> + '_ {
        self.filter_events(move |e| {
            let day = truncate_to_day(e.timestamp);
            day >= start && day <= end
        })
    }

    /// Events emitted by any user in `user_ids`
    pub fn events_for_users<'a>(
        &'a self,
        user_ids: &'a BTreeSet<UserId>,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        self.filter_events(move |e| user_ids.contains(&e.user_id))
    }

    /// Events carrying the given feature label
    pub fn events_with_feature<'a>(
        &'a self,
        feature: &'a str,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        self.filter_events(move |e| e.feature.as_deref() == Some(feature))
    }

    /// Events grouped by user, each group in timestamp order
    ///
    /// Users without events are absent.
    pub fn events_by_user(&self) -> BTreeMap<UserId, Vec<&Event>> {
        let mut grouped: BTreeMap<UserId, Vec<&Event>> = BTreeMap::new();
        for event in &self.events {
            grouped.entry(event.user_id).or_default().push(event);
        }
        grouped
    }

    /// Number of distinct users with at least one event
    pub fn active_user_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.user_id)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

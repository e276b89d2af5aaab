//! Per-user cooldown between ticket openings.
//!
//! Entries live in memory only and expire on their own: an expired entry is
//! dropped the first time it is looked at, and the sweeper prunes the rest.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Tracks the last ticket opening per user.
///
/// Thread-safe and async-compatible.
pub struct RateLimiter {
    cooldown: Duration,
    last_opened: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl RateLimiter {
    /// A zero cooldown disables limiting.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_opened: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(Duration::from_secs(minutes * 60))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub async fn is_limited(&self, user_id: &str) -> Option<u64> {
        self.is_limited_at(user_id, Utc::now()).await
    }

    /// Whole minutes (rounded up, at least 1) until `user_id` may open again.
    ///
    /// Returns `None` when the user is free; an expired entry is removed.
    pub async fn is_limited_at(&self, user_id: &str, now: DateTime<Utc>) -> Option<u64> {
        if self.cooldown.is_zero() {
            return None;
        }

        let last = {
            let entries = self.last_opened.read().await;
            *entries.get(user_id)?
        };

        match self.remaining(last, now) {
            Some(remaining) => Some(ceil_minutes(remaining)),
            None => {
                let mut entries = self.last_opened.write().await;
                // re-check: a record may have landed between the two locks
                if entries
                    .get(user_id)
                    .is_some_and(|t| self.remaining(*t, now).is_none())
                {
                    entries.remove(user_id);
                }
                None
            }
        }
    }

    pub async fn record(&self, user_id: &str) {
        self.record_at(user_id, Utc::now()).await
    }

    pub async fn record_at(&self, user_id: &str, now: DateTime<Utc>) {
        if self.cooldown.is_zero() {
            return;
        }
        self.last_opened
            .write()
            .await
            .insert(user_id.to_string(), now);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.last_opened.write().await;
        let before = entries.len();
        entries.retain(|_, last| self.remaining(*last, now).is_some());
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.last_opened.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.last_opened.read().await.is_empty()
    }

    fn remaining(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        let elapsed = (now - last).to_std().unwrap_or_default();
        self.cooldown
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }
}

fn ceil_minutes(remaining: Duration) -> u64 {
    remaining.as_millis().div_ceil(60_000).max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_unknown_user_is_free() {
        let limiter = RateLimiter::from_minutes(10);
        assert_eq!(limiter.is_limited("u1").await, None);
    }

    #[tokio::test]
    async fn test_recorded_user_is_limited_with_rounded_up_minutes() {
        let limiter = RateLimiter::from_minutes(10);
        let t0 = Utc::now();
        limiter.record_at("u1", t0).await;

        assert_eq!(limiter.is_limited_at("u1", t0).await, Some(10));
        let later = t0 + ChronoDuration::seconds(61);
        // 8m59s left
        assert_eq!(limiter.is_limited_at("u1", later).await, Some(9));
        let almost = t0 + ChronoDuration::milliseconds(10 * 60_000 - 1);
        assert_eq!(limiter.is_limited_at("u1", almost).await, Some(1));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_check() {
        let limiter = RateLimiter::from_minutes(10);
        let t0 = Utc::now();
        limiter.record_at("u1", t0).await;

        let after = t0 + ChronoDuration::minutes(10);
        assert_eq!(limiter.is_limited_at("u1", after).await, None);
        assert!(limiter.is_empty().await);
    }

    #[tokio::test]
    async fn test_prune_expired() {
        let limiter = RateLimiter::from_minutes(10);
        let t0 = Utc::now();
        limiter.record_at("old", t0 - ChronoDuration::minutes(30)).await;
        limiter.record_at("fresh", t0).await;

        assert_eq!(limiter.prune_expired(t0).await, 1);
        assert_eq!(limiter.len().await, 1);
        assert!(limiter.is_limited_at("fresh", t0).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_cooldown_disables() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.record("u1").await;
        assert_eq!(limiter.is_limited("u1").await, None);
        assert!(limiter.is_empty().await);
    }

    #[test]
    fn test_ceil_minutes() {
        assert_eq!(ceil_minutes(Duration::from_millis(1)), 1);
        assert_eq!(ceil_minutes(Duration::from_secs(60)), 1);
        assert_eq!(ceil_minutes(Duration::from_secs(61)), 2);
    }
}

//! Expiry of stored entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::CacheEntry;

/// Entries whose age reaches `max_age_hours` are purged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupPolicy {
    pub max_age_hours: u64,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self { max_age_hours: 24 }
    }
}

impl CleanupPolicy {
    pub fn new(max_age: chrono::Duration) -> Self {
        Self {
            max_age_hours: max_age.num_hours().max(0) as u64,
        }
    }

    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.max_age_hours as i64)
    }

    /// Whether `entry` has outlived the policy at `now`
    pub fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        is_expired(entry, now, self.max_age())
    }
}

pub(crate) fn is_expired(entry: &CacheEntry, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
    entry.age(now) >= max_age
}

/// Result of a purge pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupStats {
    pub removed_count: usize,
    pub remaining_count: usize,
}

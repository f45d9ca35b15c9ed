//! Cache entry structure

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tunesense_core::AnalysisResult;

/// A cached analysis and the moment it was stored.
///
/// Entries are replaced, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// The analysis served on a hit
    pub result: Arc<AnalysisResult>,

    /// Wall-clock time of insertion
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(result: Arc<AnalysisResult>) -> Self {
        Self::stored_at(result, Utc::now())
    }

    pub(crate) fn stored_at(result: Arc<AnalysisResult>, stored_at: DateTime<Utc>) -> Self {
        Self { result, stored_at }
    }

    /// Time elapsed between insertion and `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.stored_at
    }
}

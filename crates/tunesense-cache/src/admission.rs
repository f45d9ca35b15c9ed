//! Rules deciding which fresh analyses are worth caching
//!
//! A video's comment section keeps moving while it is new, so analyses of
//! recent uploads are served but not stored. Quiet videos are skipped too:
//! with few comments the aggregate is not stable enough to reuse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tunesense_core::AnalysisResult;

/// Outcome of evaluating a result against an [`AdmissionPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    /// The video is not older than the freshness window
    TooFresh { age_days: i64 },
    /// The video has fewer comments than the activity threshold
    TooQuiet { comments: usize },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdmissionPolicy {
    /// Videos must be strictly older than this to be cached
    #[serde(default = "default_freshness_days")]
    pub freshness_days: u32,

    /// Minimum number of normalized comments
    #[serde(default = "default_activity_threshold")]
    pub activity_threshold: usize,
}

fn default_freshness_days() -> u32 {
    10
}

fn default_activity_threshold() -> usize {
    20
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            freshness_days: default_freshness_days(),
            activity_threshold: default_activity_threshold(),
        }
    }
}

impl AdmissionPolicy {
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::days(self.freshness_days as i64)
    }

    pub fn evaluate(&self, result: &AnalysisResult, now: DateTime<Utc>) -> Admission {
        let age = result.video_age(now);
        if age <= self.freshness() {
            return Admission::TooFresh {
                age_days: age.num_days(),
            };
        }

        let comments = result.comment_count();
        if comments < self.activity_threshold {
            return Admission::TooQuiet { comments };
        }

        Admission::Admit
    }

    pub fn admits(&self, result: &AnalysisResult, now: DateTime<Utc>) -> bool {
        self.evaluate(result, now).is_admitted()
    }
}

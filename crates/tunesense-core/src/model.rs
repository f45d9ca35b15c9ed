//! Analysis data model.

use std::borrow::Borrow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::AttributeScoreMap;

/// Identifier of one resolved video. The only index into the analysis cache.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self(video_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CanonicalKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A comment as delivered by the comment source, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawComment {
    pub text: String,
    pub like_count: u64,
}

impl RawComment {
    pub fn new(text: impl Into<String>, like_count: u64) -> Self {
        Self {
            text: text.into(),
            like_count,
        }
    }
}

/// A normalized comment. `like_count` drives its aggregation weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub text: String,
    pub like_count: u64,
}

/// Sentiment of one text, or the aggregate over many.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SentimentScore {
    /// Overall strength of emotion, >= 0
    pub magnitude: f64,
    /// Polarity, typically in [-1, 1]
    pub score: f64,
}

impl SentimentScore {
    pub fn new(magnitude: f64, score: f64) -> Self {
        Self { magnitude, score }
    }

    /// The neutral value returned when there is nothing to weigh.
    pub fn neutral() -> Self {
        Self::default()
    }
}

/// Descriptive data about a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub channel: String,
    pub published_at: DateTime<Utc>,
}

/// The aggregate judgment for one video. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub canonical_key: CanonicalKey,
    pub attribute_scores: AttributeScoreMap,
    pub aggregate_sentiment: SentimentScore,
    pub comments: Vec<Comment>,
    pub metadata: VideoMetadata,
}

impl AnalysisResult {
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Age of the video at `now`.
    pub fn video_age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.metadata.published_at
    }
}

//! Engagement-weighted sentiment aggregation

use serde::{Deserialize, Serialize};
use tunesense_core::SentimentScore;

/// How a comment's like count turns into its aggregation weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingPolicy {
    /// Weight = likes. Comments nobody liked do not move the aggregate.
    #[default]
    LikesOnly,
    /// Weight = likes + 1, so every comment counts at least once.
    LikesPlusOne,
}

impl WeightingPolicy {
    pub fn weight(self, like_count: u64) -> f64 {
        match self {
            Self::LikesOnly => like_count as f64,
            Self::LikesPlusOne => like_count as f64 + 1.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "likes_only" => Some(Self::LikesOnly),
            "likes_plus_one" => Some(Self::LikesPlusOne),
            _ => None,
        }
    }
}

/// Weighted mean of magnitude and score over `(score, like_count)` samples.
///
/// Returns [`SentimentScore::neutral`] when the total weight is zero.
/// Inputs are neither clamped nor renormalized.
pub fn aggregate(samples: &[(SentimentScore, u64)], policy: WeightingPolicy) -> SentimentScore {
    let mut total = 0.0;
    let mut magnitude = 0.0;
    let mut score = 0.0;

    for (sentiment, likes) in samples {
        let weight = policy.weight(*likes);
        total += weight;
        magnitude += sentiment.magnitude * weight;
        score += sentiment.score * weight;
    }

    if total == 0.0 {
        return SentimentScore::neutral();
    }

    SentimentScore::new(magnitude / total, score / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(magnitude: f64, score: f64) -> SentimentScore {
        SentimentScore::new(magnitude, score)
    }

    #[test]
    fn test_empty_is_neutral() {
        assert_eq!(aggregate(&[], WeightingPolicy::LikesOnly), SentimentScore::neutral());
        assert_eq!(aggregate(&[], WeightingPolicy::LikesPlusOne), SentimentScore::neutral());
    }

    #[test]
    fn test_all_zero_likes_is_neutral() {
        let samples = [(s(0.9, 0.9), 0), (s(0.4, -0.7), 0)];
        assert_eq!(aggregate(&samples, WeightingPolicy::LikesOnly), SentimentScore::neutral());
    }

    #[test]
    fn test_weighted_average() {
        let samples = [(s(1.0, 1.0), 10), (s(-1.0, -1.0), 30)];
        assert_eq!(aggregate(&samples, WeightingPolicy::LikesOnly), s(-0.5, -0.5));
    }

    #[test]
    fn test_zero_like_comment_contributes_nothing() {
        let with = [(s(0.5, 0.25), 4), (s(3.0, -1.0), 0)];
        let without = [(s(0.5, 0.25), 4)];
        assert_eq!(
            aggregate(&with, WeightingPolicy::LikesOnly),
            aggregate(&without, WeightingPolicy::LikesOnly)
        );
    }

    #[test]
    fn test_likes_plus_one_counts_everyone() {
        let samples = [(s(1.0, 1.0), 0), (s(0.0, -1.0), 0)];
        assert_eq!(aggregate(&samples, WeightingPolicy::LikesPlusOne), s(0.5, 0.0));
    }

    #[test]
    fn test_no_clamping() {
        let samples = [(s(7.5, 3.0), 1)];
        assert_eq!(aggregate(&samples, WeightingPolicy::LikesOnly), s(7.5, 3.0));
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(WeightingPolicy::parse("likes_only"), Some(WeightingPolicy::LikesOnly));
        assert_eq!(WeightingPolicy::parse("Likes-Plus-One"), Some(WeightingPolicy::LikesPlusOne));
        assert_eq!(WeightingPolicy::parse("uniform"), None);
    }
}

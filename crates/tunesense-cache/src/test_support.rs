use chrono::{DateTime, Utc};
use tunesense_core::{
    AnalysisResult, AttributeScoreMap, CanonicalKey, Comment, SentimentScore, ToxicityAttribute,
    VideoMetadata,
};

pub fn sample_result(key: &str) -> AnalysisResult {
    let published_at = "2019-03-01T12:00:00Z".parse().unwrap();
    let mut result = result_with(key, 2, published_at);
    result.comments[0].text = "Ce refrain me donne des frissons à chaque fois".to_string();
    result.comments[1].text = "这首歌太好听了".to_string();
    result
}

pub fn result_with(key: &str, comments: usize, published_at: DateTime<Utc>) -> AnalysisResult {
    let mut scores = AttributeScoreMap::new();
    scores.insert(ToxicityAttribute::Toxicity, 0.1234567890123);
    scores.insert(ToxicityAttribute::Flirtation, 0.5);

    AnalysisResult {
        canonical_key: CanonicalKey::new(key),
        attribute_scores: scores,
        aggregate_sentiment: SentimentScore::new(0.8123456789, -0.3333333333333333),
        comments: (0..comments)
            .map(|i| Comment {
                text: format!("comment number {}", i),
                like_count: i as u64,
            })
            .collect(),
        metadata: VideoMetadata {
            title: "Song".to_string(),
            channel: "Artist".to_string(),
            published_at,
        },
    }
}

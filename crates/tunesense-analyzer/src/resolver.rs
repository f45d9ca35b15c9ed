//! Mapping user input to one canonical video

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use tunesense_core::{AnalysisError, CanonicalKey, CommentSource, RawComment, VideoSearch};

use crate::guard::CallGuard;

/// Length of a platform video id
pub const VIDEO_ID_LEN: usize = 11;

/// Whether `input` has the shape of a literal video id.
pub fn looks_like_video_id(input: &str) -> bool {
    input.chars().count() == VIDEO_ID_LEN && !input.chars().any(char::is_whitespace)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    /// The input itself was a valid video id
    DirectId,
    /// The input was searched and the first hit taken
    Search,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub key: CanonicalKey,
    /// Comments already fetched while probing a direct id
    pub comments: Option<Vec<RawComment>>,
    pub via: ResolvedVia,
}

pub struct VideoResolver {
    search: Arc<dyn VideoSearch>,
    comments: Arc<dyn CommentSource>,
    guard: CallGuard,
}

impl VideoResolver {
    pub fn new(search: Arc<dyn VideoSearch>, comments: Arc<dyn CommentSource>, guard: CallGuard) -> Self {
        Self {
            search,
            comments,
            guard,
        }
    }

    pub async fn resolve(&self, input: &str) -> Result<Resolution, AnalysisError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AnalysisError::not_found(input));
        }

        if looks_like_video_id(input) {
            match self
                .guard
                .call("comments", || self.comments.comment_threads(input))
                .await
            {
                Ok(comments) => {
                    debug!("Resolved {:?} as a direct video id", input);
                    return Ok(Resolution {
                        key: CanonicalKey::new(input),
                        comments: Some(comments),
                        via: ResolvedVia::DirectId,
                    });
                }
                Err(e) => {
                    info!("Direct lookup of {:?} failed ({}), falling back to search", input, e);
                }
            }
        }

        let hits = self.guard.call("search", || self.search.search(input)).await?;
        match hits.into_iter().next() {
            Some(video_id) => {
                debug!("Resolved {:?} via search to {}", input, video_id);
                Ok(Resolution {
                    key: CanonicalKey::new(video_id),
                    comments: None,
                    via: ResolvedVia::Search,
                })
            }
            None => Err(AnalysisError::not_found(input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSearch {
        hits: HashMap<String, Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VideoSearch for FakeSearch {
        async fn search(&self, query: &str) -> Result<Vec<String>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.hits.get(query).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeComments {
        videos: HashMap<String, Vec<RawComment>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommentSource for FakeComments {
        async fn comment_threads(&self, video_id: &str) -> Result<Vec<RawComment>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.videos
                .get(video_id)
                .cloned()
                .ok_or_else(|| AnalysisError::not_found(video_id))
        }
    }

    fn resolver(search: FakeSearch, comments: FakeComments) -> (VideoResolver, Arc<FakeSearch>, Arc<FakeComments>) {
        let search = Arc::new(search);
        let comments = Arc::new(comments);
        let guard = CallGuard::default().with_retries(0, Duration::from_millis(1));
        (
            VideoResolver::new(search.clone(), comments.clone(), guard),
            search,
            comments,
        )
    }

    #[test]
    fn test_video_id_shape() {
        assert!(looks_like_video_id("dQw4w9WgXcQ"));
        assert!(!looks_like_video_id("dQw4w9WgXc"));
        assert!(!looks_like_video_id("dQw4 9WgXcQ"));
        assert!(!looks_like_video_id("never gonna give you up"));
    }

    #[tokio::test]
    async fn test_direct_id_reuses_fetched_comments() {
        let mut comments = FakeComments::default();
        comments
            .videos
            .insert("dQw4w9WgXcQ".to_string(), vec![RawComment::new("classic", 3)]);
        let (resolver, search, _) = resolver(FakeSearch::default(), comments);

        let resolution = resolver.resolve("  dQw4w9WgXcQ ").await.unwrap();

        assert_eq!(resolution.key.as_str(), "dQw4w9WgXcQ");
        assert_eq!(resolution.via, ResolvedVia::DirectId);
        assert_eq!(resolution.comments, Some(vec![RawComment::new("classic", 3)]));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_free_text_goes_to_search() {
        let mut query = FakeSearch::default();
        query.hits.insert(
            "hello world".to_string(),
            vec!["aaaaaaaaaaa".to_string(), "bbbbbbbbbbb".to_string()],
        );
        let (resolver, search, comments) = resolver(query, FakeComments::default());

        let resolution = resolver.resolve("hello world").await.unwrap();

        // 11 chars but contains a space: never probed as an id
        assert_eq!(comments.calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolution.key.as_str(), "aaaaaaaaaaa");
        assert_eq!(resolution.via, ResolvedVia::Search);
        assert!(resolution.comments.is_none());
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_id_shaped_miss_falls_back_to_search() {
        let mut search = FakeSearch::default();
        search
            .hits
            .insert("despacito!!".to_string(), vec!["kJQP7kiw5Fk".to_string()]);
        let (resolver, search, comments) = resolver(search, FakeComments::default());

        let resolution = resolver.resolve("despacito!!").await.unwrap();

        assert_eq!(comments.calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolution.key.as_str(), "kJQP7kiw5Fk");
    }

    #[tokio::test]
    async fn test_no_results_is_not_found() {
        let (resolver, _, _) = resolver(FakeSearch::default(), FakeComments::default());

        let err = resolver.resolve("no such song anywhere").await.unwrap_err();
        assert!(err.is_not_found());

        let err = resolver.resolve("   ").await.unwrap_err();
        assert!(err.is_not_found());
    }
}

//! The cached analysis pipeline
//!
//! resolve -> cache lookup -> fetch -> normalize -> score -> aggregate ->
//! admission -> maybe cache. Duplicate concurrent work is collapsed twice:
//! once per request string and once per canonical key, so two different
//! inputs naming the same video still share a computation.

use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{debug, info};
use tunesense_cache::{AdmissionPolicy, AnalysisCache};
use tunesense_core::{
    AnalysisError, AnalysisResult, AttributeScoreMap, CanonicalKey, Comment, CommentSource,
    MetadataSource, RawComment, SentimentProvider, SentimentScore, ToxicityAttribute,
    ToxicityProvider, VideoSearch,
};
use tunesense_utils::{build_corpus, normalize_comments};

use crate::aggregate::{WeightingPolicy, aggregate};
use crate::guard::CallGuard;
use crate::resolver::{VideoResolver, looks_like_video_id};
use crate::singleflight::SingleFlight;

/// External services the pipeline talks to
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn VideoSearch>,
    pub comments: Arc<dyn CommentSource>,
    pub metadata: Arc<dyn MetadataSource>,
    pub sentiment: Arc<dyn SentimentProvider>,
    pub toxicity: Arc<dyn ToxicityProvider>,
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub attributes: Vec<ToxicityAttribute>,
    pub weighting: WeightingPolicy,
    /// Upper bound on concurrent per-comment sentiment calls
    pub max_concurrent: usize,
    pub admission: AdmissionPolicy,
    /// When false the cache is neither consulted nor filled
    pub use_cache: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            attributes: ToxicityAttribute::ALL.to_vec(),
            weighting: WeightingPolicy::default(),
            max_concurrent: 8,
            admission: AdmissionPolicy::default(),
            use_cache: true,
        }
    }
}

/// Where a served result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResultSource {
    Cache,
    Computed { admitted: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub result: Arc<AnalysisResult>,
    pub source: ResultSource,
}

impl AnalysisOutcome {
    fn from_cache(result: Arc<AnalysisResult>) -> Self {
        Self {
            result,
            source: ResultSource::Cache,
        }
    }
}

type Computation = Result<(Arc<AnalysisResult>, bool), AnalysisError>;

pub struct AnalysisService {
    cache: Arc<AnalysisCache>,
    resolver: VideoResolver,
    collaborators: Collaborators,
    guard: CallGuard,
    options: AnalysisOptions,
    requests: SingleFlight<String, Result<AnalysisOutcome, AnalysisError>>,
    computations: SingleFlight<CanonicalKey, Computation>,
}

impl AnalysisService {
    pub fn new(
        cache: Arc<AnalysisCache>,
        collaborators: Collaborators,
        guard: CallGuard,
        options: AnalysisOptions,
    ) -> Self {
        let resolver = VideoResolver::new(
            collaborators.search.clone(),
            collaborators.comments.clone(),
            guard.clone(),
        );

        Self {
            cache,
            resolver,
            collaborators,
            guard,
            options,
            requests: SingleFlight::new(),
            computations: SingleFlight::new(),
        }
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze the video named by `input`: a literal video id or free text.
    pub async fn analyze(&self, input: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let input = input.trim();

        if looks_like_video_id(input) {
            if let Some(result) = self.cached(input) {
                return Ok(AnalysisOutcome::from_cache(result));
            }
        }

        self.requests
            .run(input.to_string(), || self.resolve_and_compute(input))
            .await
    }

    fn cached(&self, key: &str) -> Option<Arc<AnalysisResult>> {
        if !self.options.use_cache {
            return None;
        }
        let entry = self.cache.retrieve(key)?;
        info!("Serving {} from cache", key);
        Some(entry.result)
    }

    async fn resolve_and_compute(&self, input: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let resolution = self.resolver.resolve(input).await?;

        if let Some(result) = self.cached(resolution.key.as_str()) {
            return Ok(AnalysisOutcome::from_cache(result));
        }

        let key = resolution.key;
        let prefetched = resolution.comments;
        let (result, admitted) = self
            .computations
            .run(key.clone(), move || self.compute(key, prefetched))
            .await?;

        Ok(AnalysisOutcome {
            result,
            source: ResultSource::Computed { admitted },
        })
    }

    async fn compute(&self, key: CanonicalKey, prefetched: Option<Vec<RawComment>>) -> Computation {
        info!("Analyzing {}", key);

        let (raw, metadata) = tokio::try_join!(
            self.fetch_comments(&key, prefetched),
            self.guard
                .call("metadata", || self.collaborators.metadata.video_metadata(key.as_str())),
        )?;

        let comments = normalize_comments(&raw);
        let sentiments = self.score_comments(&comments).await?;
        let attribute_scores = self.score_corpus(&comments).await?;

        let samples: Vec<(SentimentScore, u64)> = sentiments
            .into_iter()
            .zip(comments.iter().map(|c| c.like_count))
            .collect();
        let aggregate_sentiment = aggregate(&samples, self.options.weighting);

        let result = Arc::new(AnalysisResult {
            canonical_key: key.clone(),
            attribute_scores,
            aggregate_sentiment,
            comments,
            metadata,
        });

        let admitted = self.options.use_cache && self.admit(&key, &result);
        Ok((result, admitted))
    }

    async fn fetch_comments(
        &self,
        key: &CanonicalKey,
        prefetched: Option<Vec<RawComment>>,
    ) -> Result<Vec<RawComment>, AnalysisError> {
        match prefetched {
            Some(comments) => Ok(comments),
            None => {
                self.guard
                    .call("comments", || self.collaborators.comments.comment_threads(key.as_str()))
                    .await
            }
        }
    }

    /// Per-comment sentiment, in comment order
    async fn score_comments(&self, comments: &[Comment]) -> Result<Vec<SentimentScore>, AnalysisError> {
        stream::iter(comments)
            .map(|comment| {
                self.guard
                    .call("sentiment", move || self.collaborators.sentiment.analyze(&comment.text))
            })
            .buffered(self.options.max_concurrent.max(1))
            .try_collect()
            .await
    }

    async fn score_corpus(&self, comments: &[Comment]) -> Result<AttributeScoreMap, AnalysisError> {
        if comments.is_empty() || self.options.attributes.is_empty() {
            return Ok(AttributeScoreMap::new());
        }

        let corpus = build_corpus(comments);
        self.guard
            .call("toxicity", || {
                self.collaborators
                    .toxicity
                    .analyze(&corpus, &self.options.attributes)
            })
            .await
    }

    fn admit(&self, key: &CanonicalKey, result: &Arc<AnalysisResult>) -> bool {
        let verdict = self.options.admission.evaluate(result, Utc::now());
        if verdict.is_admitted() {
            self.cache.add(key.clone(), result.clone());
            debug!("Cached analysis of {}", key);
            true
        } else {
            debug!("Not caching {}: {:?}", key, verdict);
            false
        }
    }
}

//! Collaborator interfaces.
//!
//! The pipeline only sees these traits. Concrete HTTP clients live in
//! `tunesense-providers`; tests substitute in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::attribute::{AttributeScoreMap, ToxicityAttribute};
use crate::error::{AnalysisError, SecretError};
use crate::model::{RawComment, SentimentScore, VideoMetadata};

/// Keyword search over the video platform.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Video ids matching `query`, best match first.
    async fn search(&self, query: &str) -> Result<Vec<String>, AnalysisError>;
}

/// Top-level comment threads of a video.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn comment_threads(&self, video_id: &str) -> Result<Vec<RawComment>, AnalysisError>;
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, AnalysisError>;
}

/// Document-level sentiment oracle.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<SentimentScore, AnalysisError>;
}

/// Attribute scoring oracle.
#[async_trait]
pub trait ToxicityProvider: Send + Sync {
    async fn analyze(
        &self,
        text: &str,
        attributes: &[ToxicityAttribute],
    ) -> Result<AttributeScoreMap, AnalysisError>;
}

/// Source of key material. Synchronous: it is only consulted during cache
/// load and save.
pub trait SecretStore: Send + Sync {
    fn secret(&self, name: &str) -> Result<Vec<u8>, SecretError>;
}

/// Secret store backed by a fixed map.
#[derive(Debug, Default, Clone)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Vec<u8>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn secret(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::Missing(name.to_string()))
    }
}

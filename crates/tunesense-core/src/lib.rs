//! Core types and traits for tunesense.
//!
//! This crate provides fundamental types used across all tunesense components:
//! - Toxicity attributes scored over a comment corpus (ToxicityAttribute)
//! - Comment, sentiment and video metadata models
//! - The analysis result that is cached and served
//! - Collaborator traits for the video platform, analysis providers and secrets

mod attribute;
mod error;
mod model;
mod sources;

pub use attribute::{AttributeScoreMap, ToxicityAttribute};
pub use error::{AnalysisError, SecretError};
pub use model::{AnalysisResult, CanonicalKey, Comment, RawComment, SentimentScore, VideoMetadata};
pub use sources::{
    CommentSource, MetadataSource, SecretStore, SentimentProvider, StaticSecretStore,
    ToxicityProvider, VideoSearch,
};

//! Analysis pipeline for tunesense.
//!
//! This crate provides:
//! - Resolution of free text or literal ids to a canonical video
//! - Like-weighted sentiment aggregation
//! - Timeout/retry guarding of collaborator calls
//! - Single-flight collapsing of duplicate work
//! - The cached end-to-end analysis service

pub mod aggregate;
pub mod guard;
pub mod pipeline;
pub mod resolver;
pub mod singleflight;

pub use aggregate::{WeightingPolicy, aggregate};
pub use guard::{CallGuard, CallPolicy};
pub use pipeline::{AnalysisOptions, AnalysisOutcome, AnalysisService, Collaborators, ResultSource};
pub use resolver::{Resolution, ResolvedVia, VideoResolver, looks_like_video_id};
pub use singleflight::SingleFlight;

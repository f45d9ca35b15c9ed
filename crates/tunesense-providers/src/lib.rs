//! HTTP implementations of the tunesense collaborator traits.
//!
//! - `YouTubeClient`: search, comment threads and video metadata
//! - `NaturalLanguageClient`: document sentiment
//! - `PerspectiveClient`: toxicity attribute scores
//! - `EnvSecretStore`: API and cache keys from the environment

mod http;
pub mod language;
pub mod perspective;
pub mod secrets;
pub mod youtube;

pub use language::{ANALYSIS_KEY_NAME, DEFAULT_LANGUAGE_BASE_URL, NaturalLanguageClient};
pub use perspective::{DEFAULT_PERSPECTIVE_BASE_URL, PerspectiveClient};
pub use secrets::EnvSecretStore;
pub use youtube::{DEFAULT_YOUTUBE_BASE_URL, YOUTUBE_KEY_NAME, YouTubeClient};

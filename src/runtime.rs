//! Construction of the cache, collaborators and analysis service from config

use std::sync::Arc;

use anyhow::{Context, Result};
use tunesense_analyzer::{AnalysisService, CallGuard, Collaborators};
use tunesense_cache::{AnalysisCache, CleanupStats, LoadOutcome};
use tunesense_core::SecretStore;
use tunesense_providers::{
    ANALYSIS_KEY_NAME, EnvSecretStore, NaturalLanguageClient, PerspectiveClient,
    YOUTUBE_KEY_NAME, YouTubeClient,
};

use crate::config::TunesenseConfig;

/// Environment prefix tried before the bare secret name
pub const SECRET_ENV_PREFIX: &str = "TUNESENSE_";

pub fn env_secrets() -> Arc<dyn SecretStore> {
    Arc::new(EnvSecretStore::with_prefix(SECRET_ENV_PREFIX))
}

pub fn build_cache(config: &TunesenseConfig, secrets: Arc<dyn SecretStore>) -> AnalysisCache {
    let cache = AnalysisCache::new(&config.cache.path, secrets)
        .with_secret_name(&config.cache.secret_name)
        .with_cipher(config.cache.cipher);

    if config.cache.enabled {
        cache
    } else {
        cache.disabled()
    }
}

/// Load the cache file and drop expired entries. Runs before any request is served.
pub fn warm_up(cache: &AnalysisCache, config: &TunesenseConfig) -> (LoadOutcome, CleanupStats) {
    let outcome = cache.load();
    let stats = cache.purge_expired(config.cache.to_cleanup_policy().max_age());
    (outcome, stats)
}

fn api_key(secrets: &dyn SecretStore, name: &str) -> Result<String> {
    let bytes = secrets
        .secret(name)
        .with_context(|| format!("API key {} is not available", name))?;
    String::from_utf8(bytes).with_context(|| format!("API key {} is not valid UTF-8", name))
}

/// HTTP clients for every collaborator, keyed from `secrets`
pub fn build_collaborators(
    config: &TunesenseConfig,
    secrets: &dyn SecretStore,
) -> Result<Collaborators> {
    let providers = &config.providers;
    let youtube_key = api_key(secrets, YOUTUBE_KEY_NAME)?;
    let analysis_key = api_key(secrets, ANALYSIS_KEY_NAME)?;

    let youtube = Arc::new(YouTubeClient::new(
        &providers.youtube_base_url,
        youtube_key,
        providers.max_comments,
    ));

    Ok(Collaborators {
        search: youtube.clone(),
        comments: youtube.clone(),
        metadata: youtube,
        sentiment: Arc::new(NaturalLanguageClient::new(
            &providers.language_base_url,
            analysis_key.clone(),
        )),
        toxicity: Arc::new(PerspectiveClient::new(
            &providers.perspective_base_url,
            analysis_key,
        )),
    })
}

pub fn build_service(
    config: &TunesenseConfig,
    cache: Arc<AnalysisCache>,
    collaborators: Collaborators,
    use_cache: bool,
) -> AnalysisService {
    AnalysisService::new(
        cache,
        collaborators,
        CallGuard::new(&config.providers.to_call_policy()),
        config.to_analysis_options(use_cache),
    )
}

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tunesense_analyzer::{AnalysisOptions, CallPolicy, WeightingPolicy};
use tunesense_cache::{AdmissionPolicy, CipherSuite, CleanupPolicy, DEFAULT_SECRET_NAME};
use tunesense_core::ToxicityAttribute;
use tunesense_providers::{
    DEFAULT_LANGUAGE_BASE_URL, DEFAULT_PERSPECTIVE_BASE_URL, DEFAULT_YOUTUBE_BASE_URL,
};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TunesenseConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub admission: AdmissionPolicy,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Persistent analysis cache settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Encrypted cache file
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Entries at least this old are purged at startup
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,

    /// Secret the encryption key is derived from
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    #[serde(default)]
    pub cipher: CipherSuite,

    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("tunesense-cache.bin")
}

fn default_max_age_hours() -> u64 {
    24
}

fn default_secret_name() -> String {
    DEFAULT_SECRET_NAME.to_string()
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_age_hours: default_max_age_hours(),
            secret_name: default_secret_name(),
            cipher: CipherSuite::default(),
            enabled: default_cache_enabled(),
        }
    }
}

impl CacheConfig {
    pub fn to_cleanup_policy(&self) -> CleanupPolicy {
        CleanupPolicy {
            max_age_hours: self.max_age_hours,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub weighting: WeightingPolicy,

    /// Concurrent per-comment sentiment calls
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Toxicity attributes requested for the comment corpus
    #[serde(default = "default_attributes")]
    pub attributes: Vec<ToxicityAttribute>,
}

fn default_max_concurrent() -> usize {
    8
}

fn default_attributes() -> Vec<ToxicityAttribute> {
    ToxicityAttribute::ALL.to_vec()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingPolicy::default(),
            max_concurrent: default_max_concurrent(),
            attributes: default_attributes(),
        }
    }
}

/// Remote API settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Comments fetched per video
    #[serde(default = "default_max_comments")]
    pub max_comments: usize,

    #[serde(default = "default_youtube_base_url")]
    pub youtube_base_url: String,

    #[serde(default = "default_language_base_url")]
    pub language_base_url: String,

    #[serde(default = "default_perspective_base_url")]
    pub perspective_base_url: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_max_comments() -> usize {
    100
}

fn default_youtube_base_url() -> String {
    DEFAULT_YOUTUBE_BASE_URL.to_string()
}

fn default_language_base_url() -> String {
    DEFAULT_LANGUAGE_BASE_URL.to_string()
}

fn default_perspective_base_url() -> String {
    DEFAULT_PERSPECTIVE_BASE_URL.to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_comments: default_max_comments(),
            youtube_base_url: default_youtube_base_url(),
            language_base_url: default_language_base_url(),
            perspective_base_url: default_perspective_base_url(),
        }
    }
}

impl ProvidersConfig {
    pub fn to_call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            backoff_base_ms: self.backoff_base_ms,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid range in {field}: {value} (valid range: {valid_range})")]
    InvalidRange {
        field: String,
        value: i64,
        valid_range: String,
    },

    #[error("Invalid value in {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TunesenseConfig {
    /// Merge another config into this one (other takes precedence for set values)
    pub fn merge(&mut self, other: &TunesenseConfig) {
        let defaults = TunesenseConfig::default();

        if other.cache.path != defaults.cache.path {
            self.cache.path = other.cache.path.clone();
        }
        if other.cache.max_age_hours != defaults.cache.max_age_hours {
            self.cache.max_age_hours = other.cache.max_age_hours;
        }
        if other.cache.secret_name != defaults.cache.secret_name {
            self.cache.secret_name = other.cache.secret_name.clone();
        }
        if other.cache.cipher != defaults.cache.cipher {
            self.cache.cipher = other.cache.cipher;
        }
        if !other.cache.enabled {
            self.cache.enabled = false;
        }

        if other.admission.freshness_days != defaults.admission.freshness_days {
            self.admission.freshness_days = other.admission.freshness_days;
        }
        if other.admission.activity_threshold != defaults.admission.activity_threshold {
            self.admission.activity_threshold = other.admission.activity_threshold;
        }

        if other.analysis.weighting != defaults.analysis.weighting {
            self.analysis.weighting = other.analysis.weighting;
        }
        if other.analysis.max_concurrent != defaults.analysis.max_concurrent {
            self.analysis.max_concurrent = other.analysis.max_concurrent;
        }
        if other.analysis.attributes != defaults.analysis.attributes {
            self.analysis.attributes = other.analysis.attributes.clone();
        }

        let providers = &other.providers;
        if providers.timeout_secs != defaults.providers.timeout_secs {
            self.providers.timeout_secs = providers.timeout_secs;
        }
        if providers.max_retries != defaults.providers.max_retries {
            self.providers.max_retries = providers.max_retries;
        }
        if providers.backoff_base_ms != defaults.providers.backoff_base_ms {
            self.providers.backoff_base_ms = providers.backoff_base_ms;
        }
        if providers.max_comments != defaults.providers.max_comments {
            self.providers.max_comments = providers.max_comments;
        }
        if providers.youtube_base_url != defaults.providers.youtube_base_url {
            self.providers.youtube_base_url = providers.youtube_base_url.clone();
        }
        if providers.language_base_url != defaults.providers.language_base_url {
            self.providers.language_base_url = providers.language_base_url.clone();
        }
        if providers.perspective_base_url != defaults.providers.perspective_base_url {
            self.providers.perspective_base_url = providers.perspective_base_url.clone();
        }
    }

    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_else(|_| {
            r#"# Tunesense Configuration File

[cache]
path = "tunesense-cache.bin"
max_age_hours = 24
secret_name = "CACHE_ENCRYPTION_KEY"
cipher = "aes-256-gcm"
enabled = true

[admission]
freshness_days = 10
activity_threshold = 20

[analysis]
weighting = "likes_only"
max_concurrent = 8
attributes = ["TOXICITY", "IDENTITY_ATTACK", "INSULT", "PROFANITY", "THREAT", "SEXUALLY_EXPLICIT", "FLIRTATION"]

[providers]
timeout_secs = 10
max_retries = 2
backoff_base_ms = 250
max_comments = 100
"#
            .to_string()
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: TunesenseConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the user config file path (~/.config/tunesense/config.toml)
    pub fn get_user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tunesense").join("config.toml"))
    }

    /// Get the current directory config file path (./tunesense.toml)
    pub fn get_current_config_path() -> PathBuf {
        PathBuf::from("./tunesense.toml")
    }

    /// Load and merge configs with priority:
    /// 1. User config - lowest priority (base)
    /// 2. Current directory (./tunesense.toml)
    pub fn load_with_merged_configs() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_path) = Self::get_user_config_path() {
            if user_path.exists() {
                let user_config = Self::load_from_file(&user_path)?;
                config.merge(&user_config);
                tracing::debug!("Loaded user config from: {}", user_path.display());
            }
        }

        let current_path = Self::get_current_config_path();
        if current_path.exists() {
            let current_config = Self::load_from_file(&current_path)?;
            config.merge(&current_config);
            tracing::debug!("Loaded current directory config from: {}", current_path.display());
        }

        Ok(config)
    }

    pub fn apply_env_vars(&mut self, env_vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in env_vars {
            let Some(config_key) = key.strip_prefix("TUNESENSE_") else {
                continue;
            };

            match config_key {
                "CACHE_PATH" => self.cache.path = PathBuf::from(value),
                "CACHE_MAX_AGE_HOURS" => {
                    self.cache.max_age_hours = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid cache max_age_hours value: {}", value))?;
                }
                "CACHE_SECRET_NAME" => self.cache.secret_name = value.clone(),
                "CACHE_CIPHER" => {
                    self.cache.cipher = CipherSuite::parse(value)
                        .ok_or_else(|| anyhow!("Invalid cache cipher value: {}", value))?;
                }
                "CACHE_ENABLED" => {
                    self.cache.enabled = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid cache enabled value: {}", value))?;
                }
                "ADMISSION_FRESHNESS_DAYS" => {
                    self.admission.freshness_days = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid freshness_days value: {}", value))?;
                }
                "ADMISSION_ACTIVITY_THRESHOLD" => {
                    self.admission.activity_threshold = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid activity_threshold value: {}", value))?;
                }
                "ANALYSIS_WEIGHTING" => {
                    self.analysis.weighting = WeightingPolicy::parse(value)
                        .ok_or_else(|| anyhow!("Invalid weighting value: {}", value))?;
                }
                "ANALYSIS_MAX_CONCURRENT" => {
                    self.analysis.max_concurrent = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid max_concurrent value: {}", value))?;
                }
                "ANALYSIS_ATTRIBUTES" => {
                    self.analysis.attributes = value
                        .split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| {
                            ToxicityAttribute::parse(s)
                                .ok_or_else(|| anyhow!("Invalid toxicity attribute: {}", s.trim()))
                        })
                        .collect::<Result<_>>()?;
                }
                "PROVIDERS_TIMEOUT_SECS" => {
                    self.providers.timeout_secs = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid timeout_secs value: {}", value))?;
                }
                "PROVIDERS_MAX_RETRIES" => {
                    self.providers.max_retries = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid max_retries value: {}", value))?;
                }
                "PROVIDERS_BACKOFF_BASE_MS" => {
                    self.providers.backoff_base_ms = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid backoff_base_ms value: {}", value))?;
                }
                "PROVIDERS_MAX_COMMENTS" => {
                    self.providers.max_comments = value
                        .parse()
                        .map_err(|_| anyhow!("Invalid max_comments value: {}", value))?;
                }
                "PROVIDERS_YOUTUBE_BASE_URL" => self.providers.youtube_base_url = value.clone(),
                "PROVIDERS_LANGUAGE_BASE_URL" => self.providers.language_base_url = value.clone(),
                "PROVIDERS_PERSPECTIVE_BASE_URL" => {
                    self.providers.perspective_base_url = value.clone()
                }
                _ => {} // Ignore unknown environment variables
            }
        }
        Ok(())
    }

    /// Load configuration with full precedence chain:
    /// 1. Default values (lowest)
    /// 2. User config
    /// 3. Current directory (./tunesense.toml)
    /// 4. Explicit `--config` file
    /// 5. Environment variables (TUNESENSE_*)
    pub fn load_with_precedence(
        config_path: Option<&Path>,
        env_vars: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = Self::load_with_merged_configs()?;

        if let Some(path) = config_path {
            let explicit_config = Self::load_from_file(path)
                .map_err(|e| anyhow!("Failed to load config file {}: {}", path.display(), e))?;
            config.merge(&explicit_config);
        }

        config.apply_env_vars(env_vars)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("cache.max_age_hours", self.cache.max_age_hours as i64, 1, 24 * 365)?;
        check_range("analysis.max_concurrent", self.analysis.max_concurrent as i64, 1, 64)?;
        check_range("providers.timeout_secs", self.providers.timeout_secs as i64, 1, 600)?;
        check_range("providers.max_retries", self.providers.max_retries as i64, 0, 10)?;
        check_range("providers.max_comments", self.providers.max_comments as i64, 1, 10_000)?;

        if self.cache.secret_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cache.secret_name".to_string(),
                value: self.cache.secret_name.clone(),
            });
        }

        for (field, url) in [
            ("providers.youtube_base_url", &self.providers.youtube_base_url),
            ("providers.language_base_url", &self.providers.language_base_url),
            ("providers.perspective_base_url", &self.providers.perspective_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: url.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn to_analysis_options(&self, use_cache: bool) -> AnalysisOptions {
        AnalysisOptions {
            attributes: self.analysis.attributes.clone(),
            weighting: self.analysis.weighting,
            max_concurrent: self.analysis.max_concurrent,
            admission: self.admission.clone(),
            use_cache: use_cache && self.cache.enabled,
        }
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::InvalidRange {
            field: field.to_string(),
            value,
            valid_range: format!("{}-{}", min, max),
        });
    }
    Ok(())
}

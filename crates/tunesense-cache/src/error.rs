use thiserror::Error;
use tunesense_core::SecretError;

/// Failures of cache persistence. None of these reach request callers.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache file could not be decrypted: {0}")]
    Decryption(String),

    #[error("cache contents could not be encrypted: {0}")]
    Encryption(String),

    #[error("cache contents are malformed: {0}")]
    Serialization(String),

    #[error("cache encryption secret unavailable: {0}")]
    Secret(#[from] SecretError),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

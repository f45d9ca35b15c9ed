//! Encryption key derivation and on-disk format constants

use sha2::{Digest, Sha256};
use tunesense_core::{SecretError, SecretStore};

/// Leading bytes of every cache file.
pub const CACHE_MAGIC: &[u8; 4] = b"TSNC";

/// Version of the binary container (header + ciphertext layout).
pub const FORMAT_VERSION: u8 = 1;

/// Version of the JSON envelope inside the ciphertext.
pub const SCHEMA_VERSION: u32 = 1;

/// Secret consulted when no other name is configured.
pub const DEFAULT_SECRET_NAME: &str = "CACHE_ENCRYPTION_KEY";

/// Symmetric cipher protecting the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CipherSuite {
    #[serde(rename = "aes-128-gcm")]
    Aes128Gcm,
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl CipherSuite {
    /// Byte recorded in the file header
    pub fn id(self) -> u8 {
        match self {
            Self::Aes128Gcm => 1,
            Self::Aes256Gcm => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Aes128Gcm),
            2 => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    /// Key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm => 32,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-128-gcm" | "aes128gcm" => Some(Self::Aes128Gcm),
            "aes-256-gcm" | "aes256gcm" => Some(Self::Aes256Gcm),
            _ => None,
        }
    }
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes128Gcm => f.write_str("aes-128-gcm"),
            Self::Aes256Gcm => f.write_str("aes-256-gcm"),
        }
    }
}

/// Key material for one cipher suite, derived from an arbitrary-length secret.
#[derive(Clone)]
pub struct CacheKey {
    bytes: [u8; 32],
    suite: CipherSuite,
}

impl CacheKey {
    /// SHA-256 of the secret, truncated to the suite's key length.
    pub fn derive(secret: &[u8], suite: CipherSuite) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret);
        let digest = hasher.finalize();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self { bytes, suite }
    }

    /// Fetch `name` from the store and derive a key from it.
    pub fn from_store(
        store: &dyn SecretStore,
        name: &str,
        suite: CipherSuite,
    ) -> Result<Self, SecretError> {
        let secret = store.secret(name)?;
        if secret.is_empty() {
            return Err(SecretError::Missing(name.to_string()));
        }
        Ok(Self::derive(&secret, suite))
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.suite.key_len()]
    }
}

impl std::fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheKey")
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

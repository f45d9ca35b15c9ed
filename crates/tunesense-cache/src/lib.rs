//! Tunesense analysis cache
//!
//! An in-memory map from canonical video key to finished analysis, persisted
//! between runs as a single encrypted file. Persistence problems never
//! surface to callers: a file that cannot be read is treated as an empty
//! cache and a failed save only costs the next run its warm start.

pub mod admission;
pub mod cleanup;
pub mod entry;
pub mod error;
pub mod key;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use admission::{Admission, AdmissionPolicy};
pub use cleanup::{CleanupPolicy, CleanupStats};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use key::{CacheKey, CipherSuite, DEFAULT_SECRET_NAME, FORMAT_VERSION, SCHEMA_VERSION};
pub use storage::CacheStorage;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tunesense_core::{AnalysisResult, CanonicalKey, SecretStore};

use crate::storage::EntryMap;

/// What `load` found on disk
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { entries: usize },
    /// No cache file yet
    Missing,
    /// The file exists but has no content
    Empty,
    /// The file could not be used; the cache starts empty
    Discarded(CacheError),
    Disabled,
}

/// What `save` did
#[derive(Debug)]
pub enum SaveOutcome {
    Saved { entries: usize, bytes: usize },
    Failed(CacheError),
    Disabled,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub file_size_bytes: Option<u64>,
}

/// Main cache interface
pub struct AnalysisCache {
    entries: Mutex<EntryMap>,
    storage: CacheStorage,
    secrets: Arc<dyn SecretStore>,
    secret_name: String,
    cipher: CipherSuite,
    enabled: bool,
}

impl AnalysisCache {
    /// Create an empty cache persisted at `path`, keyed by the default secret
    pub fn new<P: AsRef<Path>>(path: P, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            entries: Mutex::new(EntryMap::new()),
            storage: CacheStorage::new(path),
            secrets,
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            cipher: CipherSuite::default(),
            enabled: true,
        }
    }

    pub fn with_secret_name(mut self, name: impl Into<String>) -> Self {
        self.secret_name = name.into();
        self
    }

    pub fn with_cipher(mut self, cipher: CipherSuite) -> Self {
        self.cipher = cipher;
        self
    }

    /// Disable the cache: lookups miss, inserts and persistence are no-ops
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    fn lock(&self) -> MutexGuard<'_, EntryMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_key(&self) -> Result<CacheKey, CacheError> {
        Ok(CacheKey::from_store(
            self.secrets.as_ref(),
            &self.secret_name,
            self.cipher,
        )?)
    }

    /// Replace the in-memory map with the contents of the cache file.
    ///
    /// Never fails: any problem is logged and leaves the cache empty.
    pub fn load(&self) -> LoadOutcome {
        if !self.enabled {
            return LoadOutcome::Disabled;
        }

        let outcome = match self.try_load() {
            Ok(Some(map)) => {
                let count = map.len();
                *self.lock() = map;
                LoadOutcome::Loaded { entries: count }
            }
            Ok(None) if self.storage.path().exists() => LoadOutcome::Empty,
            Ok(None) => LoadOutcome::Missing,
            Err(e) => LoadOutcome::Discarded(e),
        };

        match &outcome {
            LoadOutcome::Loaded { entries } => {
                log::info!("Cache loaded: {} entries from {}", entries, self.path().display());
            }
            LoadOutcome::Missing | LoadOutcome::Empty => {
                log::info!("No cached analyses at {}, starting empty", self.path().display());
                self.lock().clear();
            }
            LoadOutcome::Discarded(e) => {
                log::warn!("Discarding cache file {}: {}", self.path().display(), e);
                self.lock().clear();
            }
            LoadOutcome::Disabled => {}
        }

        outcome
    }

    fn try_load(&self) -> Result<Option<EntryMap>, CacheError> {
        let blob = match self.storage.read()? {
            Some(blob) if !blob.is_empty() => blob,
            _ => return Ok(None),
        };

        let key = self.cache_key()?;
        let plaintext = storage::open(&key, &blob)?;
        Ok(Some(storage::decode_entries(&plaintext)?))
    }

    /// Write the current map to disk, replacing the previous file atomically.
    ///
    /// Failures are logged and reported in the outcome, never raised.
    pub fn save(&self) -> SaveOutcome {
        if !self.enabled {
            return SaveOutcome::Disabled;
        }

        let snapshot = self.lock().clone();
        match self.try_save(&snapshot) {
            Ok(bytes) => {
                log::info!(
                    "Cache saved: {} entries ({} bytes) to {}",
                    snapshot.len(),
                    bytes,
                    self.path().display()
                );
                SaveOutcome::Saved {
                    entries: snapshot.len(),
                    bytes,
                }
            }
            Err(e) => {
                log::error!("Failed to save cache to {}: {}", self.path().display(), e);
                SaveOutcome::Failed(e)
            }
        }
    }

    fn try_save(&self, snapshot: &EntryMap) -> Result<usize, CacheError> {
        let key = self.cache_key()?;
        let plaintext = storage::encode_entries(snapshot)?;
        let blob = storage::seal(&key, &plaintext)?;
        self.storage.write(&blob)?;
        Ok(blob.len())
    }

    /// Insert or replace the entry for `key`, stamped now
    pub fn add(&self, key: CanonicalKey, result: Arc<AnalysisResult>) {
        if !self.enabled {
            return;
        }
        log::debug!("Cache stored: {}", key);
        self.lock().insert(key, CacheEntry::new(result));
    }

    /// Look up an entry. No side effects.
    pub fn retrieve(&self, key: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        let entry = self.lock().get(key).cloned();
        if entry.is_some() {
            log::debug!("Cache hit: {}", key);
        } else {
            log::debug!("Cache miss: {}", key);
        }
        entry
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry at least `max_age` old
    pub fn purge_expired(&self, max_age: chrono::Duration) -> CleanupStats {
        self.purge_expired_at(Utc::now(), max_age)
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> CleanupStats {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !cleanup::is_expired(entry, now, max_age));

        let stats = CleanupStats {
            removed_count: before - entries.len(),
            remaining_count: entries.len(),
        };
        if stats.removed_count > 0 {
            log::info!("Purged {} expired cache entries", stats.removed_count);
        }
        stats
    }

    /// Remove all entries from memory. The file is untouched until the next save.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Keys and insertion times, oldest first
    pub fn keys(&self) -> Vec<(CanonicalKey, DateTime<Utc>)> {
        let mut keys: Vec<_> = self
            .lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.stored_at))
            .collect();
        keys.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            total_entries: entries.len(),
            oldest: entries.values().map(|e| e.stored_at).min(),
            newest: entries.values().map(|e| e.stored_at).max(),
            file_size_bytes: self.storage.size(),
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_at(&self, key: &str, stored_at: DateTime<Utc>) {
        let entry = CacheEntry::stored_at(Arc::new(test_support::sample_result(key)), stored_at);
        self.lock().insert(CanonicalKey::new(key), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{result_with, sample_result};
    use proptest::prelude::*;
    use tempfile::TempDir;
    use tunesense_core::StaticSecretStore;

    fn secrets(value: &str) -> Arc<dyn SecretStore> {
        Arc::new(StaticSecretStore::new().with_secret(DEFAULT_SECRET_NAME, value))
    }

    fn cache_in(dir: &TempDir, secret: &str) -> AnalysisCache {
        AnalysisCache::new(dir.path().join("analysis.cache"), secrets(secret))
    }

    #[test]
    fn test_add_retrieve_delete() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");

        assert!(cache.retrieve("aaaaaaaaaaa").is_none());

        let result = Arc::new(sample_result("aaaaaaaaaaa"));
        cache.add(CanonicalKey::new("aaaaaaaaaaa"), result.clone());

        let entry = cache.retrieve("aaaaaaaaaaa").unwrap();
        assert!(Arc::ptr_eq(&entry.result, &result));

        assert!(cache.delete("aaaaaaaaaaa"));
        assert!(!cache.delete("aaaaaaaaaaa"));
        assert!(cache.retrieve("aaaaaaaaaaa").is_none());
    }

    #[test]
    fn test_add_replaces_existing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        let key = CanonicalKey::new("aaaaaaaaaaa");

        cache.add(key.clone(), Arc::new(result_with("aaaaaaaaaaa", 1, Utc::now())));
        cache.add(key, Arc::new(result_with("aaaaaaaaaaa", 30, Utc::now())));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.retrieve("aaaaaaaaaaa").unwrap().result.comment_count(), 30);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");

        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));
        cache.add(CanonicalKey::new("bbbbbbbbbbb"), Arc::new(sample_result("bbbbbbbbbbb")));
        let expected = cache.retrieve("aaaaaaaaaaa").unwrap();

        assert!(matches!(cache.save(), SaveOutcome::Saved { entries: 2, .. }));

        let reloaded = cache_in(&temp_dir, "secret");
        assert!(matches!(reloaded.load(), LoadOutcome::Loaded { entries: 2 }));
        assert_eq!(reloaded.retrieve("aaaaaaaaaaa").unwrap(), expected);
        assert!(reloaded.retrieve("bbbbbbbbbbb").is_some());
    }

    #[test]
    fn test_file_is_not_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));
        cache.save();

        let bytes = std::fs::read(cache.path()).unwrap();
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(!haystack.contains("aaaaaaaaaaa"));
        assert!(!haystack.contains("schema_version"));
    }

    #[test]
    fn test_load_with_wrong_secret_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));
        cache.save();

        let other = cache_in(&temp_dir, "not the secret");
        other.add(CanonicalKey::new("zzzzzzzzzzz"), Arc::new(sample_result("zzzzzzzzzzz")));

        assert!(matches!(other.load(), LoadOutcome::Discarded(CacheError::Decryption(_))));
        assert!(other.is_empty());
    }

    #[test]
    fn test_load_missing_and_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        assert!(matches!(cache.load(), LoadOutcome::Missing));

        std::fs::write(cache.path(), b"").unwrap();
        assert!(matches!(cache.load(), LoadOutcome::Empty));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        std::fs::write(cache.path(), b"garbage that is not a cache").unwrap();

        assert!(matches!(cache.load(), LoadOutcome::Discarded(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_secret() {
        let temp_dir = TempDir::new().unwrap();
        let cache = AnalysisCache::new(
            temp_dir.path().join("analysis.cache"),
            Arc::new(StaticSecretStore::new()),
        );
        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));

        assert!(matches!(cache.save(), SaveOutcome::Failed(CacheError::Secret(_))));
        assert!(!cache.path().exists());
        // In-memory entries survive a failed save
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_custom_secret_name_and_cipher() {
        let temp_dir = TempDir::new().unwrap();
        let store: Arc<dyn SecretStore> =
            Arc::new(StaticSecretStore::new().with_secret("MY_KEY", "value"));
        let path = temp_dir.path().join("analysis.cache");

        let cache = AnalysisCache::new(&path, store.clone())
            .with_secret_name("MY_KEY")
            .with_cipher(CipherSuite::Aes128Gcm);
        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));
        assert!(matches!(cache.save(), SaveOutcome::Saved { .. }));

        let mismatched = AnalysisCache::new(&path, store).with_secret_name("MY_KEY");
        assert!(matches!(mismatched.load(), LoadOutcome::Discarded(_)));
    }

    #[test]
    fn test_disabled_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret").disabled();

        cache.add(CanonicalKey::new("aaaaaaaaaaa"), Arc::new(sample_result("aaaaaaaaaaa")));
        assert!(cache.retrieve("aaaaaaaaaaa").is_none());
        assert!(matches!(cache.load(), LoadOutcome::Disabled));
        assert!(matches!(cache.save(), SaveOutcome::Disabled));
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_stats_and_keys() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        let now = Utc::now();

        cache.insert_at("bbbbbbbbbbb", now - chrono::Duration::hours(1));
        cache.insert_at("aaaaaaaaaaa", now - chrono::Duration::hours(5));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.oldest, Some(now - chrono::Duration::hours(5)));
        assert_eq!(stats.newest, Some(now - chrono::Duration::hours(1)));
        assert_eq!(stats.file_size_bytes, None);

        let keys: Vec<_> = cache.keys().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![CanonicalKey::new("aaaaaaaaaaa"), CanonicalKey::new("bbbbbbbbbbb")]);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, "secret");
        let now = Utc::now();

        cache.insert_at("aaaaaaaaaaa", now - chrono::Duration::hours(2));
        cache.insert_at("bbbbbbbbbbb", now - chrono::Duration::hours(25));
        cache.insert_at("ccccccccccc", now - chrono::Duration::hours(24));

        let stats = cache.purge_expired_at(now, chrono::Duration::hours(24));
        assert_eq!(stats.removed_count, 2);
        assert_eq!(stats.remaining_count, 1);
        assert!(cache.retrieve("aaaaaaaaaaa").is_some());
    }

    proptest! {
        #[test]
        fn purge_keeps_exactly_the_young_entries(ages in proptest::collection::vec(0i64..72 * 3600, 0..40)) {
            let temp_dir = TempDir::new().unwrap();
            let cache = cache_in(&temp_dir, "secret");
            let now = Utc::now();
            let max_age = chrono::Duration::hours(24);

            for (i, age) in ages.iter().enumerate() {
                cache.insert_at(&format!("video{:06}", i), now - chrono::Duration::seconds(*age));
            }

            cache.purge_expired_at(now, max_age);

            let expected = ages.iter().filter(|age| **age < max_age.num_seconds()).count();
            prop_assert_eq!(cache.len(), expected);
            for (_, stored_at) in cache.keys() {
                prop_assert!(now - stored_at < max_age);
            }
        }
    }
}

//! Encrypted single-file persistence for the cache map
//!
//! File layout:
//!
//! ```text
//! magic "TSNC" | format version (u8) | cipher id (u8) | nonce (12 bytes) | ciphertext
//! ```
//!
//! The ciphertext decrypts to a JSON envelope carrying its own schema version
//! and the `CanonicalKey -> CacheEntry` map.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use serde::{Deserialize, Serialize};
use tunesense_core::CanonicalKey;

use crate::entry::CacheEntry;
use crate::error::{CacheError, Result};
use crate::key::{CACHE_MAGIC, CacheKey, CipherSuite, FORMAT_VERSION, SCHEMA_VERSION};

const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = CACHE_MAGIC.len() + 2 + NONCE_LEN;

pub type EntryMap = HashMap<CanonicalKey, CacheEntry>;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema_version: u32,
    entries: &'a EntryMap,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    schema_version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    entries: EntryMap,
}

/// Serialize the map into the versioned JSON envelope.
pub fn encode_entries(entries: &EntryMap) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        schema_version: SCHEMA_VERSION,
        entries,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Parse a JSON envelope, rejecting unknown schema versions.
pub fn decode_entries(bytes: &[u8]) -> Result<EntryMap> {
    let header: EnvelopeHeader = serde_json::from_slice(bytes)?;
    if header.schema_version != SCHEMA_VERSION {
        return Err(CacheError::Serialization(format!(
            "unsupported schema version {} (expected {})",
            header.schema_version, SCHEMA_VERSION
        )));
    }

    let envelope: Envelope = serde_json::from_slice(bytes)?;
    Ok(envelope.entries)
}

/// Encrypt `plaintext` and wrap it in the file header.
pub fn seal(key: &CacheKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let (nonce, ciphertext) = match key.suite() {
        CipherSuite::Aes128Gcm => encrypt_with::<Aes128Gcm>(key.as_bytes(), plaintext)?,
        CipherSuite::Aes256Gcm => encrypt_with::<Aes256Gcm>(key.as_bytes(), plaintext)?,
    };

    let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    blob.extend_from_slice(CACHE_MAGIC);
    blob.push(FORMAT_VERSION);
    blob.push(key.suite().id());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Validate the header of `blob` and decrypt its payload.
pub fn open(key: &CacheKey, blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < HEADER_LEN || !blob.starts_with(CACHE_MAGIC) {
        return Err(CacheError::Decryption("not a tunesense cache file".to_string()));
    }

    let (header, ciphertext) = blob.split_at(HEADER_LEN);
    let version = header[CACHE_MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(CacheError::Decryption(format!(
            "unsupported format version {}",
            version
        )));
    }

    let suite_id = header[CACHE_MAGIC.len() + 1];
    match CipherSuite::from_id(suite_id) {
        Some(suite) if suite == key.suite() => {}
        Some(suite) => {
            return Err(CacheError::Decryption(format!(
                "file was written with {}, configured cipher is {}",
                suite,
                key.suite()
            )));
        }
        None => {
            return Err(CacheError::Decryption(format!("unknown cipher id {}", suite_id)));
        }
    }

    let nonce = &header[CACHE_MAGIC.len() + 2..];
    match key.suite() {
        CipherSuite::Aes128Gcm => decrypt_with::<Aes128Gcm>(key.as_bytes(), nonce, ciphertext),
        CipherSuite::Aes256Gcm => decrypt_with::<Aes256Gcm>(key.as_bytes(), nonce, ciphertext),
    }
}

fn encrypt_with<C>(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|e| CacheError::Encryption(e.to_string()))?;
    let nonce = C::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CacheError::Encryption(e.to_string()))?;
    Ok((nonce.to_vec(), ciphertext))
}

fn decrypt_with<C>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: Aead + AeadCore + KeyInit,
{
    let cipher = C::new_from_slice(key).map_err(|e| CacheError::Decryption(e.to_string()))?;
    let nonce = aes_gcm::aead::Nonce::<C>::from_slice(nonce);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CacheError::Decryption("authentication failed (wrong key or corrupted file)".to_string()))
}

/// Location of the cache file and the atomic write around it.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    path: PathBuf,
}

impl CacheStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file. `Ok(None)` when it does not exist.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents. Readers never observe a partial write.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Size of the file on disk, if present
    pub fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

//! Secrets read from the process environment

use tunesense_core::{SecretError, SecretStore};

/// Looks secrets up as environment variables, optionally under a prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `{prefix}{name}` before `name`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn lookup(name: &str) -> Result<Option<Vec<u8>>, SecretError> {
        match std::env::var(name) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value.into_bytes())),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::Unavailable {
                name: name.to_string(),
                reason: "value is not valid UTF-8".to_string(),
            }),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn secret(&self, name: &str) -> Result<Vec<u8>, SecretError> {
        if let Some(prefix) = &self.prefix {
            if let Some(value) = Self::lookup(&format!("{}{}", prefix, name))? {
                return Ok(value);
            }
        }
        Self::lookup(name)?.ok_or_else(|| SecretError::Missing(name.to_string()))
    }
}

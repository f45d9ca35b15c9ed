//! Error taxonomy shared by the resolver, the pipeline and the providers.

use thiserror::Error;

/// Failures that end (or redirect) a single analysis request.
///
/// `Clone` so a single in-flight computation can hand the same failure to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("no video found for {query:?}")]
    NotFound { query: String },

    #[error("{collaborator} request failed: {message}")]
    Upstream {
        collaborator: &'static str,
        message: String,
        transient: bool,
    },

    #[error("{collaborator} timed out after {secs} seconds")]
    Timeout { collaborator: &'static str, secs: u64 },
}

impl AnalysisError {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// A failure that will not go away by asking again (4xx, bad payload).
    pub fn upstream(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            collaborator,
            message: message.into(),
            transient: false,
        }
    }

    /// A failure worth retrying (429, 5xx, dropped connection).
    pub fn transient(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            collaborator,
            message: message.into(),
            transient: true,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisError::Timeout { .. } => true,
            AnalysisError::Upstream { transient, .. } => *transient,
            AnalysisError::NotFound { .. } => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AnalysisError::NotFound { .. })
    }
}

/// Failures of the secret store.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret {0} is not set")]
    Missing(String),

    #[error("secret {name} is unavailable: {reason}")]
    Unavailable { name: String, reason: String },
}

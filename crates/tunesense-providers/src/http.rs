//! Shared request plumbing and HTTP status classification

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tunesense_core::AnalysisError;

/// A keyed JSON API rooted at `base_url`.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub collaborator: &'static str,
    pub base_url: String,
    api_key: String,
    client: Client,
}

impl ApiClient {
    pub fn new(collaborator: &'static str, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            collaborator,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    /// GET `operation` with `params`. `subject` names what was asked for
    /// in a `NotFound`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        params: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, AnalysisError> {
        debug!("{} GET {}", self.collaborator, operation);
        let response = self
            .client
            .get(self.url(operation))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| from_reqwest(self.collaborator, e))?;

        self.read(response, subject).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
        subject: &str,
    ) -> Result<T, AnalysisError> {
        debug!("{} POST {}", self.collaborator, operation);
        let response = self
            .client
            .post(self.url(operation))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| from_reqwest(self.collaborator, e))?;

        self.read(response, subject).await
    }

    async fn read<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T, AnalysisError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| from_reqwest(self.collaborator, e))?;

        if !status.is_success() {
            return Err(classify(self.collaborator, status, &text, subject));
        }

        serde_json::from_str(&text).map_err(|e| {
            AnalysisError::upstream(self.collaborator, format!("unexpected response body: {}", e))
        })
    }
}

/// Map a non-success status onto the error taxonomy.
pub(crate) fn classify(
    collaborator: &'static str,
    status: StatusCode,
    body: &str,
    subject: &str,
) -> AnalysisError {
    let message = format!("HTTP {}: {}", status.as_u16(), truncate(body, 200));
    if status == StatusCode::NOT_FOUND {
        AnalysisError::not_found(subject)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AnalysisError::transient(collaborator, message)
    } else {
        AnalysisError::upstream(collaborator, message)
    }
}

pub(crate) fn from_reqwest(collaborator: &'static str, err: reqwest::Error) -> AnalysisError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        AnalysisError::transient(collaborator, err.to_string())
    } else {
        AnalysisError::upstream(collaborator, err.to_string())
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

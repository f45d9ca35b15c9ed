//! Cloud Natural Language sentiment client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tunesense_core::{AnalysisError, SentimentProvider, SentimentScore};

use crate::http::ApiClient;

pub const DEFAULT_LANGUAGE_BASE_URL: &str = "https://language.googleapis.com/v1";

/// Secret holding the key shared by the language and Perspective APIs
pub const ANALYSIS_KEY_NAME: &str = "NL_PERSP_KEY";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SentimentRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentResponse {
    document_sentiment: Option<DocumentSentiment>,
}

#[derive(Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    magnitude: f64,
    #[serde(default)]
    score: f64,
}

#[derive(Clone)]
pub struct NaturalLanguageClient {
    api: ApiClient,
}

impl NaturalLanguageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new("sentiment", base_url, api_key),
        }
    }
}

#[async_trait]
impl SentimentProvider for NaturalLanguageClient {
    async fn analyze(&self, text: &str) -> Result<SentimentScore, AnalysisError> {
        let request = SentimentRequest {
            document: Document {
                kind: "PLAIN_TEXT",
                content: text,
            },
            encoding_type: "UTF8",
        };

        let response: SentimentResponse = self
            .api
            .post("documents:analyzeSentiment", &request, "document")
            .await?;

        let sentiment = response.document_sentiment.ok_or_else(|| {
            AnalysisError::upstream(self.api.collaborator, "response has no documentSentiment")
        })?;
        Ok(SentimentScore::new(sentiment.magnitude, sentiment.score))
    }
}

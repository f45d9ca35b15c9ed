//! Perspective comment analyzer client

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tunesense_core::{AnalysisError, AttributeScoreMap, ToxicityAttribute, ToxicityProvider};

use crate::http::ApiClient;

pub const DEFAULT_PERSPECTIVE_BASE_URL: &str = "https://commentanalyzer.googleapis.com/v1alpha1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    comment: CommentText<'a>,
    requested_attributes: BTreeMap<&'static str, EmptyObject>,
}

#[derive(Serialize)]
struct CommentText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    attribute_scores: BTreeMap<String, AttributeScores>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScores {
    summary_score: SummaryScore,
}

#[derive(Deserialize)]
struct SummaryScore {
    value: f64,
}

#[derive(Clone)]
pub struct PerspectiveClient {
    api: ApiClient,
}

impl PerspectiveClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new("toxicity", base_url, api_key),
        }
    }
}

#[async_trait]
impl ToxicityProvider for PerspectiveClient {
    async fn analyze(
        &self,
        text: &str,
        attributes: &[ToxicityAttribute],
    ) -> Result<AttributeScoreMap, AnalysisError> {
        let request = AnalyzeRequest {
            comment: CommentText { text },
            requested_attributes: attributes
                .iter()
                .map(|attribute| (attribute.as_str(), EmptyObject {}))
                .collect(),
        };

        let response: AnalyzeResponse = self.api.post("comments:analyze", &request, "corpus").await?;

        let mut scores = AttributeScoreMap::new();
        for (name, score) in response.attribute_scores {
            match ToxicityAttribute::parse(&name) {
                Some(attribute) => {
                    scores.insert(attribute, score.summary_score.value);
                }
                None => warn!("Ignoring unknown attribute {} in response", name),
            }
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_analyze_attributes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/comments:analyze"))
            .and(body_json(json!({
                "comment": {"text": "great song. "},
                "requestedAttributes": {"INSULT": {}, "TOXICITY": {}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attributeScores": {
                    "TOXICITY": {"summaryScore": {"value": 0.02, "type": "PROBABILITY"}},
                    "INSULT": {"summaryScore": {"value": 0.01, "type": "PROBABILITY"}},
                    "SPAM": {"summaryScore": {"value": 0.5, "type": "PROBABILITY"}}
                },
                "languages": ["en"]
            })))
            .mount(&server)
            .await;

        let client = PerspectiveClient::new(server.uri(), "p-key");
        let scores = client
            .analyze("great song. ", &[ToxicityAttribute::Toxicity, ToxicityAttribute::Insult])
            .await
            .unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&ToxicityAttribute::Toxicity], 0.02);
        assert_eq!(scores[&ToxicityAttribute::Insult], 0.01);
    }

    #[tokio::test]
    async fn test_bad_request_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("LANGUAGE_NOT_SUPPORTED"))
            .mount(&server)
            .await;

        let client = PerspectiveClient::new(server.uri(), "p-key");
        let err = client.analyze("...", &ToxicityAttribute::ALL).await.unwrap_err();

        assert!(!err.is_transient());
        assert!(err.to_string().contains("LANGUAGE_NOT_SUPPORTED"));
    }
}

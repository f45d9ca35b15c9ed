//! YouTube Data API v3 client

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use tunesense_core::{
    AnalysisError, CommentSource, MetadataSource, RawComment, VideoMetadata, VideoSearch,
};

use crate::http::ApiClient;

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Secret holding the YouTube API key
pub const YOUTUBE_KEY_NAME: &str = "YOUTUBE_ANALYSIS_KEY";

/// Largest page the commentThreads endpoint serves
const MAX_PAGE_SIZE: usize = 100;
const SEARCH_RESULTS: &str = "5";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_original: Option<String>,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: u64,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    channel_title: String,
    published_at: DateTime<Utc>,
}

/// Search, comments and metadata for videos.
#[derive(Clone)]
pub struct YouTubeClient {
    api: ApiClient,
    max_comments: usize,
}

impl YouTubeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, max_comments: usize) -> Self {
        Self {
            api: ApiClient::new("youtube", base_url, api_key),
            max_comments: max_comments.max(1),
        }
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Vec<String>, AnalysisError> {
        let response: SearchResponse = self
            .api
            .get(
                "search",
                &[
                    ("part", "id"),
                    ("type", "video"),
                    ("maxResults", SEARCH_RESULTS),
                    ("q", query),
                ],
                query,
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn comment_threads(&self, video_id: &str) -> Result<Vec<RawComment>, AnalysisError> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = (self.max_comments - comments.len()).min(MAX_PAGE_SIZE).to_string();
            let mut params = vec![
                ("part", "snippet"),
                ("videoId", video_id),
                ("textFormat", "plainText"),
                ("order", "relevance"),
                ("maxResults", remaining.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: CommentThreadsResponse = self.api.get("commentThreads", &params, video_id).await?;
            comments.extend(page.items.into_iter().map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                RawComment::new(
                    snippet.text_original.unwrap_or(snippet.text_display),
                    snippet.like_count,
                )
            }));

            match page.next_page_token {
                Some(token) if comments.len() < self.max_comments => page_token = Some(token),
                _ => break,
            }
        }

        comments.truncate(self.max_comments);
        debug!("Fetched {} comments for {}", comments.len(), video_id);
        Ok(comments)
    }
}

#[async_trait]
impl MetadataSource for YouTubeClient {
    async fn video_metadata(&self, video_id: &str) -> Result<VideoMetadata, AnalysisError> {
        let response: VideosResponse = self
            .api
            .get("videos", &[("part", "snippet"), ("id", video_id)], video_id)
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::not_found(video_id))?;

        Ok(VideoMetadata {
            title: item.snippet.title,
            channel: item.snippet.channel_title,
            published_at: item.snippet.published_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn thread(text: &str, likes: u64) -> serde_json::Value {
        json!({
            "snippet": {
                "topLevelComment": {
                    "snippet": {
                        "textDisplay": format!("<b>{}</b>", text),
                        "textOriginal": text,
                        "likeCount": likes
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_search_returns_video_ids_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "bohemian rhapsody"))
            .and(query_param("key", "yt-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "fJ9rUzIMcZQ"}},
                    {"id": {"kind": "youtube#channel", "channelId": "UC123"}},
                    {"id": {"kind": "youtube#video", "videoId": "ZZZZZZZZZZZ"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(server.uri(), "yt-key", 100);
        let ids = client.search("bohemian rhapsody").await.unwrap();

        assert_eq!(ids, vec!["fJ9rUzIMcZQ".to_string(), "ZZZZZZZZZZZ".to_string()]);
    }

    #[tokio::test]
    async fn test_comment_threads_follow_pages_up_to_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("pageToken", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [thread("third", 0), thread("fourth", 9)],
                "nextPageToken": "page3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .and(query_param("videoId", "fJ9rUzIMcZQ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [thread("first", 3), thread("second", 1)],
                "nextPageToken": "page2"
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(server.uri(), "yt-key", 3);
        let comments = client.comment_threads("fJ9rUzIMcZQ").await.unwrap();

        assert_eq!(
            comments,
            vec![
                RawComment::new("first", 3),
                RawComment::new("second", 1),
                RawComment::new("third", 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commentThreads"))
            .respond_with(ResponseTemplate::new(404).set_body_string("videoNotFound"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(server.uri(), "yt-key", 100);

        assert!(client.comment_threads("nope0000000").await.unwrap_err().is_not_found());
        assert!(client.video_metadata("nope0000000").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_quota_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(server.uri(), "yt-key", 100);
        assert!(client.search("anything").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_video_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "fJ9rUzIMcZQ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{
                    "snippet": {
                        "title": "Queen – Bohemian Rhapsody",
                        "channelTitle": "Queen Official",
                        "publishedAt": "2008-08-01T11:06:40Z"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let client = YouTubeClient::new(server.uri(), "yt-key", 100);
        let metadata = client.video_metadata("fJ9rUzIMcZQ").await.unwrap();

        assert_eq!(metadata.title, "Queen – Bohemian Rhapsody");
        assert_eq!(metadata.channel, "Queen Official");
        assert_eq!(metadata.published_at.to_rfc3339(), "2008-08-01T11:06:40+00:00");
    }
}

//! YouTube Data API v3 search

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::credentials::SecretSource;
use crate::error::{LookupError, Result};
use crate::lookup::{http_client, Candidate, SEARCH_LIMIT};

pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub struct YouTubeSearch {
    http: reqwest::Client,
    api_key: SecretString,
}

impl YouTubeSearch {
    pub fn new(api_key: SecretString) -> std::result::Result<Self, LookupError> {
        Ok(Self {
            http: http_client()?,
            api_key,
        })
    }

    /// `Ok(None)` when no API key is available, so callers can skip the search
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let file = config.youtube.as_ref().and_then(|y| y.api_key_file.as_deref());
        let Some(api_key) = SecretSource::new("YouTube API key", API_KEY_ENV, file).lookup()? else {
            return Ok(None);
        };
        Ok(Some(Self::new(api_key)?))
    }

    pub async fn search(&self, query: &str) -> std::result::Result<Vec<Candidate>, LookupError> {
        tracing::debug!(query = %query, "Searching YouTube");

        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", limit.as_str()),
                ("q", query),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LookupError::Http(format!(
                "YouTube search returned HTTP {}: {}",
                status, message
            )));
        }

        let candidates = parse_search_response(&body)?;
        tracing::debug!(count = candidates.len(), "YouTube candidates");
        Ok(candidates)
    }
}

/// Turn a search response body into candidates, skipping non-video hits
pub fn parse_search_response(body: &str) -> std::result::Result<Vec<Candidate>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            Some(Candidate {
                title: unescape_html(&item.snippet.title),
                detail: unescape_html(&item.snippet.channel_title),
                url: format!("{}{}", WATCH_URL, video_id),
            })
        })
        .collect())
}

/// The API returns snippet text HTML-escaped
fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

//! Instagram platform implementation
//!
//! Publishes through the Instagram Graph API in two steps: a media container
//! is created from the public artwork URL, then the container is published.
//! Instagram fetches the image itself, so the artwork must already be served
//! at its `heroImage` URL.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::compose::{
    instagram_caption, ComposedPost, MoreInfo, PostDraft, INSTAGRAM_CAPTION_LIMIT,
};
use crate::config::InstagramConfig;
use crate::credentials::SecretSource;
use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::Post;

pub const TOKEN_ENV: &str = "INSTAGRAM_ACCESS_TOKEN";

const GRAPH_API_BASE: &str = "https://graph.facebook.com";

#[derive(Debug, Deserialize)]
struct GraphId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

pub struct InstagramClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    access_token: SecretString,
    authenticated: bool,
}

impl InstagramClient {
    pub fn new(user_id: String, access_token: SecretString, api_version: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/{}", GRAPH_API_BASE, api_version.trim_matches('/')),
            user_id,
            access_token,
            authenticated: false,
        }
    }

    /// Create a client from configuration
    ///
    /// The token comes from `INSTAGRAM_ACCESS_TOKEN` or the configured file.
    pub fn from_config(config: &InstagramConfig) -> Result<Self> {
        if config.user_id.trim().is_empty() {
            return Err(PlatformError::Authentication(
                "Instagram user id is not configured (set INSTAGRAM_USER_ID or [instagram].user_id)"
                    .to_string(),
            )
            .into());
        }

        let token = SecretSource::new(
            "Instagram access token",
            TOKEN_ENV,
            config.token_file.as_deref(),
        )
        .require()
        .map_err(|e| PlatformError::Authentication(e.to_string()))?;

        Ok(Self::new(
            config.user_id.trim().to_string(),
            token,
            &config.api_version,
        ))
    }

    async fn graph_post(
        &self,
        edge: &str,
        params: &[(&str, &str)],
        context: &str,
    ) -> Result<String> {
        let url = format!("{}/{}/{}", self.base_url, self.user_id, edge);
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("access_token", self.access_token.expose_secret()));

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        Ok(parse_graph_response(status, &body, context)?)
    }
}

#[async_trait]
impl Platform for InstagramClient {
    async fn authenticate(&mut self) -> Result<()> {
        let url = format!("{}/{}", self.base_url, self.user_id);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("fields", "id,username"),
                ("access_token", self.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(e, "authenticate"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, "authenticate"))?;

        parse_graph_response(status, &body, "authenticate")?;
        self.authenticated = true;
        tracing::debug!("Instagram account {} verified", self.user_id);

        Ok(())
    }

    async fn post(&self, post: &Post) -> Result<String> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        self.validate_content(&post.content)?;

        let image_url = post
            .attachment
            .as_ref()
            .and_then(|a| a.public_url.as_deref())
            .ok_or_else(|| {
                PlatformError::Validation(
                    "Instagram needs a public image URL (heroImage) for every post".to_string(),
                )
            })?;

        let container_id = self
            .graph_post(
                "media",
                &[("image_url", image_url), ("caption", post.content.as_str())],
                "create media container",
            )
            .await?;
        tracing::debug!("Created Instagram media container {}", container_id);

        let media_id = self
            .graph_post(
                "media_publish",
                &[("creation_id", container_id.as_str())],
                "publish media",
            )
            .await?;

        Ok(media_id)
    }

    fn compose(&self, draft: &PostDraft, _more_info: &MoreInfo) -> ComposedPost {
        instagram_caption(draft)
    }

    fn name(&self) -> &str {
        "instagram"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(INSTAGRAM_CAPTION_LIMIT)
    }

    fn is_configured(&self) -> bool {
        !self.user_id.is_empty()
    }
}

/// Interpret a Graph API response body, returning the object id on success
fn parse_graph_response(
    status: u16,
    body: &str,
    context: &str,
) -> std::result::Result<String, PlatformError> {
    if (200..300).contains(&status) {
        return serde_json::from_str::<GraphId>(body)
            .map(|parsed| parsed.id)
            .map_err(|e| {
                PlatformError::Posting(format!(
                    "Instagram returned an unexpected response ({}): {}",
                    context, e
                ))
            });
    }

    let (message, code) = match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.code),
        Err(_) => (body.trim().to_string(), None),
    };

    map_graph_error(status, code, &message, context)
}

/// Map Graph API failures to PlatformError
///
/// Error code 190 is an invalid or expired token; 4, 17, 32 and 613 are
/// throttling; 100 and 36003 are rejected parameters or media.
fn map_graph_error(
    status: u16,
    code: Option<i64>,
    message: &str,
    context: &str,
) -> std::result::Result<String, PlatformError> {
    let error = match (status, code) {
        (_, Some(190)) | (401, _) | (403, _) => PlatformError::Authentication(format!(
            "Instagram authentication failed ({}): {}. \
             Suggestion: Generate a new long-lived access token.",
            context, message
        )),
        (_, Some(4 | 17 | 32 | 613)) | (429, _) => PlatformError::RateLimit(format!(
            "Instagram rate limit exceeded ({}): {}",
            context, message
        )),
        (_, Some(100 | 36003)) | (400, _) => PlatformError::Validation(format!(
            "Instagram rejected the request ({}): {}",
            context, message
        )),
        (500..=599, _) => PlatformError::Network(format!(
            "Instagram server error ({}): {}",
            context, message
        )),
        _ => PlatformError::Posting(format!(
            "Instagram request failed ({}): HTTP {}: {}",
            context, status, message
        )),
    };

    Err(error)
}

fn map_transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    PlatformError::Network(format!(
        "Failed to reach the Instagram Graph API ({}): {}",
        context, error
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackcastError;

    fn client() -> InstagramClient {
        InstagramClient::new(
            "17841400000000000".to_string(),
            SecretString::from("token".to_string()),
            "v19.0",
        )
    }

    #[test]
    fn test_base_url_includes_version() {
        assert_eq!(client().base_url, "https://graph.facebook.com/v19.0");
    }

    #[test]
    fn test_parse_success() {
        let id = parse_graph_response(200, r#"{"id":"1789"}"#, "publish").unwrap();
        assert_eq!(id, "1789");
    }

    #[test]
    fn test_parse_success_without_id() {
        let err = parse_graph_response(200, r#"{"ok":true}"#, "publish").unwrap_err();
        assert!(matches!(err, PlatformError::Posting(_)));
    }

    #[test]
    fn test_parse_expired_token() {
        let body = r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#;
        let err = parse_graph_response(400, body, "publish").unwrap_err();
        assert!(matches!(err, PlatformError::Authentication(_)));
        assert!(err.to_string().contains("Error validating access token"));
    }

    #[test]
    fn test_parse_throttled() {
        let body = r#"{"error":{"message":"Application request limit reached","code":4}}"#;
        let err = parse_graph_response(400, body, "publish").unwrap_err();
        assert!(matches!(err, PlatformError::RateLimit(_)));
    }

    #[test]
    fn test_parse_bad_media() {
        let body = r#"{"error":{"message":"Only photo or video can be accepted as media type.","code":9004}}"#;
        let err = parse_graph_response(400, body, "create media container").unwrap_err();
        assert!(matches!(err, PlatformError::Validation(_)));
    }

    #[test]
    fn test_parse_non_json_server_error() {
        let err = parse_graph_response(502, "Bad Gateway", "publish").unwrap_err();
        assert!(matches!(err, PlatformError::Network(_)));
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_post_requires_authentication() {
        match client().post(&Post::new("caption".to_string())).await {
            Err(TrackcastError::Platform(PlatformError::Authentication(msg))) => {
                assert_eq!(msg, "Not authenticated");
            }
            other => panic!("Expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_requires_public_image_url() {
        let mut client = client();
        client.authenticated = true;

        match client.post(&Post::new("caption".to_string())).await {
            Err(TrackcastError::Platform(PlatformError::Validation(msg))) => {
                assert!(msg.contains("public image URL"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_requires_user_id() {
        let config = InstagramConfig {
            enabled: true,
            user_id: String::new(),
            token_file: None,
            api_version: "v19.0".to_string(),
        };
        assert!(InstagramClient::from_config(&config).is_err());
    }

    #[test]
    fn test_caption_limit() {
        let client = client();
        assert_eq!(client.character_limit(), Some(2200));
        assert!(client.validate_content(&"a".repeat(2200)).is_ok());
        assert!(client.validate_content(&"a".repeat(2201)).is_err());
    }
}

//! Bluesky platform implementation

use async_trait::async_trait;
use bsky_sdk::api::app::bsky::embed::images;
use bsky_sdk::api::app::bsky::feed::post::{RecordData, RecordEmbedRefs};
use bsky_sdk::api::app::bsky::richtext::facet;
use bsky_sdk::api::types::string::Datetime;
use bsky_sdk::api::types::Union;
use bsky_sdk::BskyAgent;
use secrecy::{ExposeSecret, SecretString};

use crate::compose::{
    ComposedPost, MoreInfo, PostComposer, PostDraft, SpanKind, TextSpan, BLUESKY_CHAR_LIMIT,
};
use crate::config::BlueskyConfig;
use crate::credentials::SecretSource;
use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::{Attachment, Post};

pub const PASSWORD_ENV: &str = "BLUESKY_PASSWORD";

/// Largest image blob the PDS accepts
const MAX_BLOB_BYTES: usize = 1_000_000;

/// Map Bluesky/AT Protocol errors to PlatformError
///
/// bsky-sdk errors carry XRPC status codes and AT Protocol error names only
/// in their messages, so classification sniffs both renderings.
fn map_bluesky_error<E: std::fmt::Display + std::fmt::Debug>(
    error: E,
    context: &str,
) -> PlatformError {
    let error_msg = format!("{}", error);
    let debug_msg = format!("{:?}", error);

    if error_msg.contains("401")
        || error_msg.contains("403")
        || error_msg.contains("AuthenticationRequired")
        || error_msg.contains("InvalidToken")
        || error_msg.contains("ExpiredToken")
        || debug_msg.contains("Unauthorized")
        || debug_msg.contains("Forbidden")
    {
        return PlatformError::Authentication(format!(
            "Bluesky authentication failed during {}: {}. Please check your credentials and re-authenticate.",
            context, error_msg
        ));
    }

    if error_msg.contains("InvalidCredentials")
        || error_msg.contains("AccountNotFound")
        || (context == "authentication" && error_msg.contains("invalid"))
    {
        return PlatformError::Authentication(format!(
            "Invalid Bluesky credentials: {}. Please check your handle and app password.",
            error_msg
        ));
    }

    if error_msg.contains("400")
        || error_msg.contains("413")
        || error_msg.contains("InvalidRequest")
        || error_msg.contains("InvalidRecord")
        || error_msg.contains("BlobTooLarge")
        || debug_msg.contains("BadRequest")
    {
        return PlatformError::Validation(format!(
            "Bluesky rejected the request during {}: {}. Check content length and image size.",
            context, error_msg
        ));
    }

    if error_msg.contains("429")
        || error_msg.contains("RateLimitExceeded")
        || debug_msg.contains("RateLimit")
    {
        return PlatformError::RateLimit(format!(
            "Bluesky rate limit exceeded during {}: {}. Please wait before trying again.",
            context, error_msg
        ));
    }

    if error_msg.contains("connection")
        || error_msg.contains("timeout")
        || error_msg.contains("dns")
        || debug_msg.contains("Connect")
        || debug_msg.contains("Timeout")
    {
        return PlatformError::Network(format!(
            "Network error while connecting to Bluesky PDS during {}: {}. Check your internet connection.",
            context, error_msg
        ));
    }

    PlatformError::Posting(format!(
        "Bluesky operation failed during {}: {}",
        context, error_msg
    ))
}

/// Convert located spans into AT Protocol rich-text facets
fn build_facets(spans: &[TextSpan]) -> Option<Vec<facet::Main>> {
    if spans.is_empty() {
        return None;
    }

    let facets = spans
        .iter()
        .map(|span| {
            let feature = match &span.kind {
                SpanKind::Link(uri) => facet::MainFeaturesItem::Link(Box::new(
                    facet::LinkData { uri: uri.clone() }.into(),
                )),
                SpanKind::Tag(tag) => facet::MainFeaturesItem::Tag(Box::new(
                    facet::TagData { tag: tag.clone() }.into(),
                )),
            };

            facet::MainData {
                features: vec![Union::Refs(feature)],
                index: facet::ByteSliceData {
                    byte_start: span.byte_start,
                    byte_end: span.byte_end,
                }
                .into(),
            }
            .into()
        })
        .collect();

    Some(facets)
}

pub struct BlueskyClient {
    agent: BskyAgent,
    handle: String,
    app_password: SecretString,
    authenticated: bool,
}

impl BlueskyClient {
    /// Create a new Bluesky client
    ///
    /// # Arguments
    ///
    /// * `handle` - The Bluesky handle (e.g., "user.bsky.social")
    /// * `app_password` - An app password, not the account password
    pub async fn new(handle: String, app_password: SecretString) -> Result<Self> {
        let agent = BskyAgent::builder()
            .build()
            .await
            .map_err(|e| PlatformError::Authentication(format!("Failed to create agent: {}", e)))?;

        Ok(Self {
            agent,
            handle,
            app_password,
            authenticated: false,
        })
    }

    /// Create a client from configuration
    ///
    /// The app password comes from `BLUESKY_PASSWORD` or the configured file.
    pub async fn from_config(config: &BlueskyConfig) -> Result<Self> {
        if config.handle.trim().is_empty() {
            return Err(PlatformError::Authentication(
                "Bluesky handle is not configured (set BLUESKY_HANDLE or [bluesky].handle)"
                    .to_string(),
            )
            .into());
        }

        let password = SecretSource::new(
            "Bluesky app password",
            PASSWORD_ENV,
            config.password_file.as_deref(),
        )
        .require()
        .map_err(|e| PlatformError::Authentication(e.to_string()))?;

        Self::new(config.handle.trim().to_string(), password).await
    }

    async fn upload_image(&self, attachment: &Attachment) -> Result<images::Image> {
        let bytes = tokio::fs::read(&attachment.file_path).await.map_err(|e| {
            PlatformError::Validation(format!(
                "Failed to read image {}: {}",
                attachment.file_path.display(),
                e
            ))
        })?;

        if bytes.len() > MAX_BLOB_BYTES {
            return Err(PlatformError::Validation(format!(
                "Image {} is {} bytes; Bluesky accepts at most {}",
                attachment.file_path.display(),
                bytes.len(),
                MAX_BLOB_BYTES
            ))
            .into());
        }

        let output = self
            .agent
            .api
            .com
            .atproto
            .repo
            .upload_blob(bytes)
            .await
            .map_err(|e| map_bluesky_error(e, "image upload"))?;

        tracing::debug!("Uploaded {} to Bluesky", attachment.file_path.display());

        Ok(images::ImageData {
            alt: attachment.alt_text.clone(),
            aspect_ratio: None,
            image: output.data.blob,
        }
        .into())
    }
}

#[async_trait]
impl Platform for BlueskyClient {
    async fn authenticate(&mut self) -> Result<()> {
        tracing::debug!("Creating Bluesky session for handle: {}", self.handle);

        self.agent
            .login(&self.handle, self.app_password.expose_secret())
            .await
            .map_err(|e| map_bluesky_error(e, "authentication"))?;

        self.authenticated = true;
        tracing::debug!("Bluesky session created");

        Ok(())
    }

    async fn post(&self, post: &Post) -> Result<String> {
        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        self.validate_content(&post.content)?;

        let embed = match &post.attachment {
            Some(attachment) => {
                let image = self.upload_image(attachment).await?;
                let images: images::Main = images::MainData {
                    images: vec![image],
                }
                .into();
                Some(Union::Refs(RecordEmbedRefs::AppBskyEmbedImagesMain(
                    Box::new(images),
                )))
            }
            None => None,
        };

        tracing::debug!(
            "Posting to Bluesky: {} characters, {} facets",
            post.content.chars().count(),
            post.spans.len()
        );

        let record = RecordData {
            created_at: Datetime::now(),
            embed,
            entities: None,
            facets: build_facets(&post.spans),
            labels: None,
            langs: None,
            reply: None,
            tags: None,
            text: post.content.clone(),
        };

        let response = self
            .agent
            .create_record(record)
            .await
            .map_err(|e| map_bluesky_error(e, "posting"))?;

        let at_uri = response.uri.to_string();
        tracing::debug!("Posted to Bluesky: {}", at_uri);

        Ok(at_uri)
    }

    fn compose(&self, draft: &PostDraft, more_info: &MoreInfo) -> ComposedPost {
        PostComposer::bluesky(more_info.clone()).compose(draft)
    }

    fn name(&self) -> &str {
        "bluesky"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(BLUESKY_CHAR_LIMIT)
    }

    fn is_configured(&self) -> bool {
        !self.handle.is_empty()
    }
}

//! Mastodon platform implementation
//!
//! Uses the megalodon library, so any instance speaking the Mastodon API
//! (Pleroma, Akkoma, GoToSocial) works the same way.

use async_trait::async_trait;
use megalodon::entities::{StatusVisibility, UploadMedia};
use megalodon::megalodon::{PostStatusInputOptions, PostStatusOutput, UploadMediaInputOptions};
use megalodon::{Megalodon, SNS};
use secrecy::ExposeSecret;

use crate::compose::{
    mastodon_status, ComposedPost, MoreInfo, PostDraft, MASTODON_DEFAULT_CHAR_LIMIT,
};
use crate::config::MastodonConfig;
use crate::credentials::SecretSource;
use crate::error::{PlatformError, Result};
use crate::platforms::{extract_http_status, Platform};
use crate::types::Post;

pub const TOKEN_ENV: &str = "MASTODON_ACCESS_TOKEN";

/// Mastodon platform client
pub struct MastodonClient {
    client: Box<dyn Megalodon + Send + Sync>,

    /// The instance URL (e.g., "https://mastodon.social")
    instance_url: String,

    visibility: StatusVisibility,

    /// Character limit for posts (instance-specific)
    character_limit: usize,
}

impl MastodonClient {
    /// Create a new Mastodon client with the default 500 character limit
    ///
    /// The real limit is fetched from the instance during `authenticate`.
    pub fn new(instance_url: String, access_token: String, visibility: String) -> Result<Self> {
        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token),
            None,
        )
        .map_err(|e| {
            PlatformError::Authentication(format!("Failed to create Mastodon client: {:?}", e))
        })?;

        Ok(Self {
            client,
            instance_url,
            visibility: parse_visibility(&visibility)?,
            character_limit: MASTODON_DEFAULT_CHAR_LIMIT,
        })
    }

    /// Create a client from configuration
    ///
    /// The token comes from `MASTODON_ACCESS_TOKEN` or the configured token file.
    pub fn from_config(config: &MastodonConfig) -> Result<Self> {
        let token = SecretSource::new(
            "Mastodon access token",
            TOKEN_ENV,
            config.token_file.as_deref(),
        )
        .require()
        .map_err(|e| PlatformError::Authentication(e.to_string()))?;

        Self::new(
            normalize_instance_url(&config.instance),
            token.expose_secret().to_string(),
            config.visibility.clone(),
        )
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Query the instance for its character limit
    pub async fn fetch_instance_info(&mut self) -> Result<()> {
        let response = self
            .client
            .get_instance()
            .await
            .map_err(|e| map_megalodon_error(e, "fetch instance info"))?;

        self.character_limit = response.json.configuration.statuses.max_characters as usize;
        tracing::debug!(
            "{} allows {} characters per status",
            self.instance_url,
            self.character_limit
        );

        Ok(())
    }

    async fn upload(&self, post: &Post) -> Result<Option<String>> {
        let Some(attachment) = &post.attachment else {
            return Ok(None);
        };

        let options = UploadMediaInputOptions {
            description: Some(attachment.alt_text.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .upload_media(
                attachment.file_path.to_string_lossy().to_string(),
                Some(&options),
            )
            .await
            .map_err(|e| map_megalodon_error(e, "upload media"))?;

        let media_id = match response.json {
            UploadMedia::Attachment(media) => media.id,
            UploadMedia::AsyncAttachment(media) => media.id,
        };
        tracing::debug!("Uploaded {} as media {}", attachment.file_path.display(), media_id);

        Ok(Some(media_id))
    }
}

#[async_trait]
impl Platform for MastodonClient {
    async fn authenticate(&mut self) -> Result<()> {
        self.client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "authenticate"))?;

        if let Err(e) = self.fetch_instance_info().await {
            tracing::warn!(
                "Could not fetch instance limit, keeping {}: {}",
                self.character_limit,
                e
            );
        }

        Ok(())
    }

    async fn post(&self, post: &Post) -> Result<String> {
        self.validate_content(&post.content)?;

        let media_ids = self.upload(post).await?.map(|id| vec![id]);
        let options = PostStatusInputOptions {
            media_ids,
            visibility: Some(self.visibility.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .post_status(post.content.clone(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "post status"))?;

        let post_id = match response.json {
            PostStatusOutput::Status(status) => status.id,
            PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(post_id)
    }

    fn compose(&self, draft: &PostDraft, _more_info: &MoreInfo) -> ComposedPost {
        mastodon_status(draft)
    }

    fn name(&self) -> &str {
        "mastodon"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(self.character_limit)
    }

    fn is_configured(&self) -> bool {
        // Client is always configured if it was successfully created
        true
    }
}

fn normalize_instance_url(instance: &str) -> String {
    let instance = instance.trim().trim_end_matches('/');
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{}", instance)
    }
}

fn parse_visibility(value: &str) -> Result<StatusVisibility> {
    match value.trim().to_lowercase().as_str() {
        "" | "public" => Ok(StatusVisibility::Public),
        "unlisted" => Ok(StatusVisibility::Unlisted),
        "private" => Ok(StatusVisibility::Private),
        "direct" => Ok(StatusVisibility::Direct),
        other => Err(PlatformError::Validation(format!(
            "Unknown Mastodon visibility '{}'. Valid options: public, unlisted, private, direct",
            other
        ))
        .into()),
    }
}

/// Map megalodon errors to PlatformError
///
/// - HTTP 401/403 → `Authentication`
/// - HTTP 422 → `Validation` (rejected content or media)
/// - HTTP 429 → `RateLimit`
/// - HTTP 5xx and connection failures → `Network`
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    let error_str = error.to_string();
    let error_lower = error_str.to_lowercase();

    match extract_http_status(&error_str) {
        Some(401) | Some(403) => PlatformError::Authentication(format!(
            "Mastodon authentication failed ({}): {}. \
             Suggestion: Verify your access token is valid and has the write:statuses and write:media scopes.",
            context, error_str
        )),
        Some(422) => PlatformError::Validation(format!(
            "Mastodon rejected the request ({}): {}. \
             Suggestion: Check the status length and the image format.",
            context, error_str
        )),
        Some(429) => PlatformError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}. Suggestion: Wait a few minutes before posting again.",
            context, error_str
        )),
        Some(500..=599) => PlatformError::Network(format!(
            "Mastodon server error ({}): {}. Suggestion: The instance may be experiencing issues.",
            context, error_str
        )),
        Some(_) => {
            PlatformError::Network(format!("Mastodon HTTP error ({}): {}", context, error_str))
        }
        None => {
            if error_lower.contains("unauthorized")
                || error_lower.contains("forbidden")
                || error_lower.contains("token")
            {
                PlatformError::Authentication(format!(
                    "Mastodon authentication failed ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("parse")
                || error_lower.contains("json")
                || error_lower.contains("deserialize")
            {
                PlatformError::Posting(format!(
                    "Mastodon response parse error ({}): {}. \
                     The instance may run an incompatible API version.",
                    context, error_str
                ))
            } else if error_lower.contains("no such file") || error_lower.contains("os error") {
                PlatformError::Validation(format!(
                    "Mastodon media could not be read ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("rate limit")
                || error_lower.contains("too many requests")
            {
                PlatformError::RateLimit(format!(
                    "Mastodon rate limit exceeded ({}): {}",
                    context, error_str
                ))
            } else {
                PlatformError::Network(format!(
                    "Mastodon error ({}): {}. \
                     Suggestion: Check your network connection and instance availability.",
                    context, error_str
                ))
            }
        }
    }
}

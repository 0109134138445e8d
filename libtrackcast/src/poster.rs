//! Cross-posting orchestration
//!
//! Each selected platform composes its own text from one shared draft and
//! publishes it with the track artwork. Platforms are handled one after
//! another; a failure on one is recorded in its [`PostResult`] and does not
//! stop the others. Nothing is retried.

use serde::Serialize;
use tracing::{info, warn};

use crate::compose::{rich_text_spans, ComposedPost, Destination, MoreInfo, PostDraft};
use crate::config::Config;
use crate::error::{ConfigError, Result, TrackcastError};
use crate::platforms::{
    bluesky::BlueskyClient, instagram::InstagramClient, mastodon::MastodonClient, Platform,
};
use crate::types::{Attachment, Post, PostResult, TrackRecord};

/// What a platform would receive, for `--dry-run`
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub platform: String,
    #[serde(flatten)]
    pub post: ComposedPost,
    pub character_limit: Option<usize>,
    pub within_limit: bool,
}

pub struct CrossPoster {
    platforms: Vec<Box<dyn Platform>>,
    more_info: MoreInfo,
}

impl CrossPoster {
    pub fn new(platforms: Vec<Box<dyn Platform>>, more_info: MoreInfo) -> Self {
        Self {
            platforms,
            more_info,
        }
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.iter().map(|p| p.name()).collect()
    }

    /// Compose every platform's text without touching the network
    pub fn preview(&self, record: &TrackRecord, hashtags: &[String]) -> Vec<Preview> {
        let draft = PostDraft::new(record, hashtags);

        self.platforms
            .iter()
            .map(|platform| {
                let post = platform.compose(&draft, &self.more_info);
                Preview {
                    platform: platform.name().to_string(),
                    within_limit: platform.validate_content(&post.text).is_ok(),
                    character_limit: platform.character_limit(),
                    post,
                }
            })
            .collect()
    }

    /// Authenticate and post to every platform in order
    ///
    /// Platforms that report themselves unconfigured are recorded as failed
    /// without being contacted.
    ///
    /// # Errors
    ///
    /// Fails before posting anywhere when the record has no usable artwork;
    /// per-platform failures are reported in the returned results instead.
    pub async fn publish(
        &mut self,
        record: &TrackRecord,
        hashtags: &[String],
    ) -> Result<Vec<PostResult>> {
        let attachment = Attachment::for_track(record)?;
        if !attachment.file_path.exists() {
            return Err(TrackcastError::InvalidInput(format!(
                "Artwork not found: {}",
                attachment.file_path.display()
            )));
        }

        let draft = PostDraft::new(record, hashtags);
        let mut results = Vec::with_capacity(self.platforms.len());

        for platform in self.platforms.iter_mut() {
            let name = platform.name().to_string();
            info!("Posting to platform: {}", name);

            if !platform.is_configured() {
                warn!("Skipping {}: client is missing credentials", name);
                results.push(PostResult::failed(
                    &name,
                    format!("{} is not configured; run track-setup", name),
                ));
                continue;
            }

            if let Err(e) = platform.authenticate().await {
                warn!("Failed to authenticate with {}: {}", name, e);
                results.push(PostResult::failed(&name, e.to_string()));
                continue;
            }

            let composed = platform.compose(&draft, &self.more_info);
            if composed.shortened {
                info!(
                    "{} post shortened to {} characters",
                    name, composed.length
                );
            }

            let spans = rich_text_spans(&composed.text, &draft, &self.more_info);
            let post = Post::new(composed.text)
                .with_spans(spans)
                .with_attachment(attachment.clone());

            match platform.post(&post).await {
                Ok(post_id) => {
                    info!("Successfully posted to {}: {}", name, post_id);
                    results.push(PostResult::posted(&name, post_id));
                }
                Err(e) => {
                    warn!("Failed to post to {}: {}", name, e);
                    results.push(PostResult::failed(&name, e.to_string()));
                }
            }
        }

        Ok(results)
    }
}

/// Compose for destinations without building any client or credentials
pub fn preview_destinations(
    destinations: &[Destination],
    record: &TrackRecord,
    hashtags: &[String],
    more_info: &MoreInfo,
) -> Vec<Preview> {
    let draft = PostDraft::new(record, hashtags);

    destinations
        .iter()
        .map(|destination| {
            let post = destination.compose(&draft, more_info);
            let limit = destination.character_limit();
            Preview {
                platform: destination.name().to_string(),
                within_limit: !post.text.trim().is_empty() && post.length <= limit,
                character_limit: Some(limit),
                post,
            }
        })
        .collect()
}

/// Decide which platforms to post to
///
/// An explicit selection wins; otherwise `[defaults].platforms` is used.
/// Duplicates are dropped, order is kept.
pub fn resolve_destinations(config: &Config, requested: &[String]) -> Result<Vec<Destination>> {
    let names: &[String] = if requested.is_empty() {
        &config.defaults.platforms
    } else {
        requested
    };

    let mut destinations = Vec::new();
    for name in names {
        let destination: Destination = name.parse().map_err(TrackcastError::InvalidInput)?;
        if !destinations.contains(&destination) {
            destinations.push(destination);
        }
    }

    if destinations.is_empty() {
        return Err(TrackcastError::InvalidInput(
            "No platforms selected".to_string(),
        ));
    }

    Ok(destinations)
}

/// Build clients for the selected destinations
///
/// Destinations without an enabled config section are skipped with a
/// warning; a section whose credentials cannot be loaded is an error.
pub async fn create_platforms(
    config: &Config,
    destinations: &[Destination],
) -> Result<Vec<Box<dyn Platform>>> {
    let mut platforms: Vec<Box<dyn Platform>> = Vec::new();

    for destination in destinations {
        if !config.is_platform_enabled(destination.name()) {
            warn!(
                "Skipping {}: no enabled [{}] section in the configuration",
                destination, destination
            );
            continue;
        }

        info!("Creating {} platform client", destination);
        let platform: Box<dyn Platform> = match destination {
            Destination::Mastodon => {
                let section = config
                    .mastodon
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingField("mastodon".to_string()))?;
                Box::new(MastodonClient::from_config(section)?)
            }
            Destination::Bluesky => {
                let section = config
                    .bluesky
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingField("bluesky".to_string()))?;
                Box::new(BlueskyClient::from_config(section).await?)
            }
            Destination::Instagram => {
                let section = config
                    .instagram
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingField("instagram".to_string()))?;
                Box::new(InstagramClient::from_config(section)?)
            }
        };
        platforms.push(platform);
    }

    if platforms.is_empty() {
        return Err(TrackcastError::InvalidInput(
            "None of the selected platforms is configured. Run track-setup to create a configuration."
                .to_string(),
        ));
    }

    Ok(platforms)
}

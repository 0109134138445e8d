//! Core types for Trackcast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compose::TextSpan;
use crate::error::{DocumentError, PlatformError, Result};

/// One reviewed track, as stored in its markdown document
///
/// URL fields are `None` when the frontmatter value is empty. `image_path`
/// is the local artwork resolved from `hero_image`; whether the file exists
/// is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    pub artist: String,
    pub artist_link: String,
    pub label: String,
    pub label_link: String,
    /// Public artwork URL (`heroImage`)
    pub hero_image: String,
    /// `YYYY-MM-DD`, kept verbatim
    pub pub_date: String,
    pub review: String,
    pub bandcamp_url: Option<String>,
    pub spotify_url: Option<String>,
    pub youtube_url: Option<String>,
    pub image_path: Option<PathBuf>,
}

impl TrackRecord {
    /// The local artwork path, required for posting
    pub fn require_image(&self) -> std::result::Result<&Path, DocumentError> {
        self.image_path
            .as_deref()
            .ok_or_else(|| DocumentError::MissingField("heroImage".to_string()))
    }

    /// Alt text used for the artwork on every platform
    pub fn alt_text(&self) -> String {
        format!("Album artwork for {} by {}", self.title, self.artist)
    }
}

// ============================================================================
// Attachment Types
// ============================================================================

/// Supported image MIME types for attachments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The artwork posted alongside the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Local file, uploaded by Mastodon and Bluesky
    pub file_path: PathBuf,
    pub mime_type: ImageMimeType,
    pub alt_text: String,
    /// Public URL of the same image, ingested by Instagram
    pub public_url: Option<String>,
}

impl Attachment {
    /// Build an attachment from a local file, detecting its MIME type
    pub fn from_path(
        file_path: impl Into<PathBuf>,
        alt_text: String,
        public_url: Option<String>,
    ) -> Result<Self> {
        let file_path = file_path.into();
        let mime_type = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageMimeType::from_extension)
            .ok_or_else(|| {
                PlatformError::Validation(format!(
                    "Unsupported image type: {}",
                    file_path.display()
                ))
            })?;

        Ok(Self {
            file_path,
            mime_type,
            alt_text,
            public_url,
        })
    }

    /// Build the attachment for a track, failing when no artwork is resolvable
    pub fn for_track(record: &TrackRecord) -> Result<Self> {
        let path = record.require_image()?;
        let public_url = Some(record.hero_image.clone()).filter(|url| !url.is_empty());
        Self::from_path(path, record.alt_text(), public_url)
    }
}

/// A composed post ready for one platform
#[derive(Debug, Clone)]
pub struct Post {
    pub content: String,
    pub attachment: Option<Attachment>,
    /// Links and hashtags located in `content`, for platforms with rich text
    pub spans: Vec<TextSpan>,
}

impl Post {
    pub fn new(content: String) -> Self {
        Self {
            content,
            attachment: None,
            spans: Vec::new(),
        }
    }

    pub fn with_spans(mut self, spans: Vec<TextSpan>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Result of posting to a single platform
#[derive(Debug, Clone, Serialize)]
pub struct PostResult {
    /// Platform name (e.g., "instagram", "mastodon", "bluesky")
    pub platform: String,
    pub success: bool,
    /// Platform-specific post ID (if successful)
    pub platform_post_id: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl PostResult {
    pub fn posted(platform: &str, platform_post_id: String) -> Self {
        Self {
            platform: platform.to_string(),
            success: true,
            platform_post_id: Some(platform_post_id),
            error: None,
        }
    }

    pub fn failed(platform: &str, error: String) -> Self {
        Self {
            platform: platform.to_string(),
            success: false,
            platform_post_id: None,
            error: Some(error),
        }
    }
}

//! Platform abstraction and implementations
//!
//! Each destination composes its own text from a shared [`PostDraft`],
//! authenticates, and publishes the text together with the track artwork.
//!
//! # Examples
//!
//! ```no_run
//! use libtrackcast::compose::{MoreInfo, PostDraft};
//! use libtrackcast::platforms::{mastodon::MastodonClient, Platform};
//! use libtrackcast::types::{Post, TrackRecord};
//!
//! # async fn example(record: TrackRecord) -> libtrackcast::error::Result<()> {
//! let mut platform = MastodonClient::new(
//!     "https://mastodon.social".to_string(),
//!     "token".to_string(),
//!     "public".to_string(),
//! )?;
//!
//! platform.authenticate().await?;
//! let draft = PostDraft::new(&record, &["techno"]);
//! let composed = platform.compose(&draft, &MoreInfo::default());
//! let post_id = platform.post(&Post::new(composed.text)).await?;
//! println!("Posted: {}", post_id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::compose::{char_len, ComposedPost, MoreInfo, PostDraft};
use crate::error::{PlatformError, Result};
use crate::types::Post;

pub mod bluesky;
pub mod instagram;
pub mod mastodon;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Unified interface over the posting destinations
#[async_trait]
pub trait Platform: Send + Sync {
    /// Establish a session or verify credentials
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Authentication` when the credentials are rejected.
    async fn authenticate(&mut self) -> Result<()>;

    /// Publish a composed post and return the platform's post id
    ///
    /// # Errors
    ///
    /// - `PlatformError::Authentication` when called before `authenticate`
    /// - `PlatformError::Validation` when the content or attachment is rejected
    /// - `PlatformError::Posting` / `PlatformError::Network` on upstream failures
    async fn post(&self, post: &Post) -> Result<String>;

    /// Build this platform's text layout for a draft
    fn compose(&self, draft: &PostDraft, more_info: &MoreInfo) -> ComposedPost;

    /// Check content against the platform's limits
    fn validate_content(&self, content: &str) -> Result<()> {
        validate_length(self.name(), content, self.character_limit())
    }

    /// Lowercase identifier ("instagram", "mastodon", "bluesky")
    fn name(&self) -> &str;

    /// Maximum post length in characters, `None` when unbounded
    fn character_limit(&self) -> Option<usize>;

    /// Whether the client holds everything it needs to authenticate
    fn is_configured(&self) -> bool;
}

/// Shared length check used by every platform
pub(crate) fn validate_length(name: &str, content: &str, limit: Option<usize>) -> Result<()> {
    if content.trim().is_empty() {
        return Err(PlatformError::Validation("Content cannot be empty".to_string()).into());
    }

    if let Some(limit) = limit {
        let count = char_len(content);
        if count > limit {
            return Err(PlatformError::Validation(format!(
                "Content exceeds {}'s {} character limit (current: {} characters)",
                name, limit, count
            ))
            .into());
        }
    }

    Ok(())
}

/// Extract an HTTP status code from an upstream error message
///
/// Looks for patterns like "HTTP 401", "status 403" or a bare "429:".
pub(crate) fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code) = after_prefix.get(0..3).and_then(|s| s.parse::<u16>().ok()) {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }

    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        let is_code = window[..3].iter().all(u8::is_ascii_digit)
            && (window[3] == b':' || window[3] == b' ')
            && (i == 0 || !bytes[i - 1].is_ascii_digit());
        if !is_code {
            continue;
        }
        let code = std::str::from_utf8(&window[..3])
            .ok()
            .and_then(|s| s.parse::<u16>().ok());
        if let Some(code) = code.filter(|c| (100..=599).contains(c)) {
            return Some(code);
        }
    }

    None
}

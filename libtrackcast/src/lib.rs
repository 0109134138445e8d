//! Trackcast - track review documents and cross-posting
//!
//! This library scrapes Bandcamp track pages into markdown review documents,
//! finds matching YouTube and Spotify links, and cross-posts a finished
//! review with its artwork to Instagram, Mastodon and Bluesky.

pub mod compose;
pub mod config;
pub mod creator;
pub mod credentials;
pub mod error;
pub mod frontmatter;
pub mod logging;
pub mod lookup;
pub mod platforms;
pub mod poster;
pub mod types;

// Re-export commonly used types
pub use compose::{ComposedPost, Destination, MoreInfo, PostComposer, PostDraft};
pub use config::Config;
pub use error::{Result, TrackcastError};
pub use frontmatter::FrontmatterParser;
pub use poster::CrossPoster;
pub use types::{Attachment, Post, PostResult, TrackRecord};

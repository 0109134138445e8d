//! Mock platform implementation for testing
//!
//! A configurable stand-in that can succeed, fail authentication, fail
//! posting, or enforce a character limit. Counters and the posted content are
//! shared through `Arc` so tests keep a handle after the platform is boxed.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::compose::{ComposedPost, MoreInfo, PostComposer, PostDraft};
use crate::error::{PlatformError, Result};
use crate::platforms::{validate_length, Platform};
use crate::types::Post;

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g., "mastodon")
    pub name: String,

    pub auth_succeeds: bool,
    pub post_succeeds: bool,
    pub auth_error: Option<String>,
    pub post_error: Option<String>,

    /// Character limit for validation and composition
    pub character_limit: Option<usize>,

    pub is_configured: bool,

    pub auth_call_count: Arc<Mutex<usize>>,
    pub post_call_count: Arc<Mutex<usize>>,

    /// Posts that have been made (for verification)
    pub posted: Arc<Mutex<Vec<Post>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            auth_succeeds: true,
            post_succeeds: true,
            auth_error: None,
            post_error: None,
            character_limit: None,
            is_configured: true,
            auth_call_count: Arc::new(Mutex::new(0)),
            post_call_count: Arc::new(Mutex::new(0)),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
pub struct MockPlatform {
    config: MockConfig,
    authenticated: bool,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            authenticated: false,
        }
    }

    /// Create a mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform that fails authentication
    pub fn auth_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            auth_succeeds: false,
            auth_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform that fails posting
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Create a mock platform with a character limit
    pub fn with_limit(name: &str, limit: usize) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            character_limit: Some(limit),
            ..Default::default()
        })
    }

    /// Create a mock platform that is not configured
    pub fn not_configured(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            is_configured: false,
            ..Default::default()
        })
    }

    /// Shared handle to the posts this platform received
    pub fn posted_handle(&self) -> Arc<Mutex<Vec<Post>>> {
        Arc::clone(&self.config.posted)
    }

    pub fn auth_call_count(&self) -> usize {
        *self.config.auth_call_count.lock().unwrap()
    }

    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    /// Get all content that was posted
    pub fn posted_content(&self) -> Vec<String> {
        self.config
            .posted
            .lock()
            .unwrap()
            .iter()
            .map(|post| post.content.clone())
            .collect()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn authenticate(&mut self) -> Result<()> {
        *self.config.auth_call_count.lock().unwrap() += 1;

        if self.config.auth_succeeds {
            self.authenticated = true;
            Ok(())
        } else {
            let error_msg = self
                .config
                .auth_error
                .clone()
                .unwrap_or_else(|| "Mock authentication failed".to_string());
            Err(PlatformError::Authentication(error_msg).into())
        }
    }

    async fn post(&self, post: &Post) -> Result<String> {
        let count = {
            let mut count = self.config.post_call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if !self.authenticated {
            return Err(PlatformError::Authentication("Not authenticated".to_string()).into());
        }

        if self.config.post_succeeds {
            self.config.posted.lock().unwrap().push(post.clone());
            Ok(format!("{}:mock-{}", self.config.name, count))
        } else {
            let error_msg = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failed".to_string());
            Err(PlatformError::Posting(error_msg).into())
        }
    }

    fn compose(&self, draft: &PostDraft, more_info: &MoreInfo) -> ComposedPost {
        PostComposer::new(more_info.clone(), self.config.character_limit).compose(draft)
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        validate_length(&self.config.name, content, self.config.character_limit)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }
}

//! Error types for Trackcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackcastError>;

#[derive(Error, Debug)]
pub enum TrackcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TrackcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TrackcastError::InvalidInput(_) => 3,
            TrackcastError::Document(DocumentError::Malformed(_)) => 3,
            TrackcastError::Platform(PlatformError::Authentication(_)) => 2,
            TrackcastError::Platform(_) => 1,
            TrackcastError::Document(_) => 1,
            TrackcastError::Config(_) => 1,
            TrackcastError::Lookup(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    WriteError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Failures of the markdown track document itself
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

/// Failures talking to Bandcamp, YouTube or Spotify
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Parse(err.to_string())
        } else {
            LookupError::Http(err.to_string())
        }
    }
}

//! Configuration management for Trackcast
//!
//! The config file is TOML. Every section has defaults, so a missing file is
//! not an error. A handful of environment variables override file values so
//! existing `.env`-style setups keep working:
//!
//! | variable               | overrides                 |
//! |------------------------|---------------------------|
//! | `MARKDOWN_OUTPUT_PATH` | `paths.markdown_dir`      |
//! | `IMAGE_OUTPUT_PATH`    | `paths.image_dir`         |
//! | `MORE_TRACKS_URL`      | `site.more_info_url`      |
//! | `MASTODON_URL`         | `mastodon.instance`       |
//! | `BLUESKY_HANDLE`       | `bluesky.handle`          |
//! | `INSTAGRAM_USER_ID`    | `instagram.user_id`       |
//! | `SPOTIPY_CLIENT_ID`    | `spotify.client_id`       |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const DEFAULT_IMAGE_URL_PREFIX: &str = "https://static.kdzu.org/images/tracks/";
pub const DEFAULT_MORE_INFO_LABEL: &str = "KDZU";
pub const DEFAULT_MORE_INFO_URL: &str = "https://kdzu.org/tracks-we-love";
pub const DEFAULT_TIMEZONE: &str = "US/Pacific";
pub const DEFAULT_VISIBILITY: &str = "public";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v19.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    pub mastodon: Option<MastodonConfig>,
    pub bluesky: Option<BlueskyConfig>,
    pub instagram: Option<InstagramConfig>,
    pub youtube: Option<YouTubeConfig>,
    pub spotify: Option<SpotifyConfig>,
}

/// Where generated markdown and artwork land
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub markdown_dir: String,
    pub image_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            markdown_dir: "~/.local/share/trackcast/tracks".to_string(),
            image_dir: "~/.local/share/trackcast/images".to_string(),
        }
    }
}

/// Public site the reviews are published on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Prefix of hero image URLs that map onto `paths.image_dir`
    #[serde(default = "default_image_url_prefix")]
    pub image_url_prefix: String,
    #[serde(default = "default_more_info_label")]
    pub more_info_label: String,
    #[serde(default = "default_more_info_url")]
    pub more_info_url: String,
    /// IANA timezone used for `pubDate`
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            image_url_prefix: default_image_url_prefix(),
            more_info_label: default_more_info_label(),
            more_info_url: default_more_info_url(),
            timezone: default_timezone(),
        }
    }
}

fn default_image_url_prefix() -> String {
    DEFAULT_IMAGE_URL_PREFIX.to_string()
}

fn default_more_info_label() -> String {
    DEFAULT_MORE_INFO_LABEL.to_string()
}

fn default_more_info_url() -> String {
    DEFAULT_MORE_INFO_URL.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub platforms: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platforms: vec![
                "instagram".to_string(),
                "mastodon".to_string(),
                "bluesky".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub instance: String,
    /// Access token file; `MASTODON_ACCESS_TOKEN` takes precedence
    pub token_file: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub handle: String,
    /// App password file; `BLUESKY_PASSWORD` takes precedence
    pub password_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Instagram professional account id used by the Graph API
    pub user_id: String,
    /// Long-lived access token file; `INSTAGRAM_ACCESS_TOKEN` takes precedence
    pub token_file: Option<String>,
    #[serde(default = "default_graph_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key file; `YOUTUBE_API_KEY` takes precedence
    pub api_key_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    /// Client secret file; `SPOTIPY_CLIENT_SECRET` takes precedence
    pub client_secret_file: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_visibility() -> String {
    DEFAULT_VISIBILITY.to_string()
}

fn default_graph_api_version() -> String {
    DEFAULT_GRAPH_API_VERSION.to_string()
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = resolve_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::ReadError)?;
        }
        std::fs::write(path, content).map_err(ConfigError::ReadError)?;
        Ok(())
    }

    /// Apply the environment overrides listed in the module docs
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_value("MARKDOWN_OUTPUT_PATH") {
            self.paths.markdown_dir = dir;
        }
        if let Some(dir) = env_value("IMAGE_OUTPUT_PATH") {
            self.paths.image_dir = dir;
        }
        if let Some(url) = env_value("MORE_TRACKS_URL") {
            self.site.more_info_url = url;
        }

        if let Some(instance) = env_value("MASTODON_URL") {
            match self.mastodon.as_mut() {
                Some(mastodon) => mastodon.instance = instance,
                None => {
                    self.mastodon = Some(MastodonConfig {
                        enabled: true,
                        instance,
                        token_file: None,
                        visibility: default_visibility(),
                    })
                }
            }
        }

        if let Some(handle) = env_value("BLUESKY_HANDLE") {
            match self.bluesky.as_mut() {
                Some(bluesky) => bluesky.handle = handle,
                None => {
                    self.bluesky = Some(BlueskyConfig {
                        enabled: true,
                        handle,
                        password_file: None,
                    })
                }
            }
        }

        if let Some(user_id) = env_value("INSTAGRAM_USER_ID") {
            match self.instagram.as_mut() {
                Some(instagram) => instagram.user_id = user_id,
                None => {
                    self.instagram = Some(InstagramConfig {
                        enabled: true,
                        user_id,
                        token_file: None,
                        api_version: default_graph_api_version(),
                    })
                }
            }
        }

        if let Some(client_id) = env_value("SPOTIPY_CLIENT_ID") {
            self.spotify.get_or_insert_with(SpotifyConfig::default).client_id = client_id;
        }
    }

    /// Expanded markdown output directory
    pub fn markdown_dir(&self) -> Result<PathBuf> {
        expand_path(&self.paths.markdown_dir)
    }

    /// Expanded artwork output directory
    pub fn image_dir(&self) -> Result<PathBuf> {
        expand_path(&self.paths.image_dir)
    }

    /// Check that both output directories exist and are writable
    pub fn validate_output_dirs(&self) -> Result<()> {
        check_writable_dir(&self.markdown_dir()?)?;
        check_writable_dir(&self.image_dir()?)?;
        Ok(())
    }

    /// Whether a platform has an enabled section
    pub fn is_platform_enabled(&self, name: &str) -> bool {
        match name {
            "mastodon" => self.mastodon.as_ref().is_some_and(|c| c.enabled),
            "bluesky" => self.bluesky.as_ref().is_some_and(|c| c.enabled),
            "instagram" => self.instagram.as_ref().is_some_and(|c| c.enabled),
            _ => false,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|e| ConfigError::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn check_writable_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(ConfigError::InvalidPath {
            path: dir.display().to_string(),
            reason: "directory does not exist".to_string(),
        }
        .into());
    }

    let probe = dir.join(".write_test");
    std::fs::write(&probe, b"test")
        .and_then(|_| std::fs::remove_file(&probe))
        .map_err(|e| ConfigError::InvalidPath {
            path: dir.display().to_string(),
            reason: format!("not writable: {}", e),
        })?;

    Ok(())
}

/// Resolve the configuration file path under the XDG config directory
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TRACKCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("trackcast").join("config.toml"))
}

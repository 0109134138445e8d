//! Secret lookup for platform and search credentials
//!
//! Every secret can come from an environment variable or from a file named
//! in the config. The environment wins. Values are trimmed and held as
//! [`SecretString`] so they are zeroed on drop and never printed by `Debug`.

use secrecy::SecretString;

use crate::config::expand_path;
use crate::error::{ConfigError, Result};

/// Where to look for one secret
#[derive(Debug, Clone, Copy)]
pub struct SecretSource<'a> {
    /// Human-readable name used in error messages (e.g. "Mastodon access token")
    pub name: &'a str,
    pub env_var: &'a str,
    pub file: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    pub fn new(name: &'a str, env_var: &'a str, file: Option<&'a str>) -> Self {
        Self {
            name,
            env_var,
            file,
        }
    }

    /// Look the secret up; `Ok(None)` when neither source provides a value
    pub fn lookup(&self) -> Result<Option<SecretString>> {
        if let Ok(value) = std::env::var(self.env_var) {
            let value = value.trim();
            if !value.is_empty() {
                tracing::debug!("{} read from {}", self.name, self.env_var);
                return Ok(Some(SecretString::from(value.to_string())));
            }
        }

        let Some(file) = self.file else {
            return Ok(None);
        };

        let path = expand_path(file)?;
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::InvalidPath {
            path: path.display().to_string(),
            reason: format!("failed to read {}: {}", self.name, e),
        })?;

        let value = content.trim();
        if value.is_empty() {
            tracing::warn!("{} file {} is empty", self.name, path.display());
            return Ok(None);
        }

        tracing::debug!("{} read from {}", self.name, path.display());
        Ok(Some(SecretString::from(value.to_string())))
    }

    /// Look the secret up, failing with `MissingField` when absent
    pub fn require(&self) -> Result<SecretString> {
        self.lookup()?.ok_or_else(|| {
            ConfigError::MissingField(format!(
                "{} (set {} or configure a file)",
                self.name, self.env_var
            ))
            .into()
        })
    }
}

use std::{fmt, path::Path};

use serde::Deserialize;

use crate::error::Result;

/// Connection settings for a session.
///
/// ```toml
/// base-url = "http://127.0.0.1:8080/api"
/// namespace = "tenant-a"
/// token = "s3cr3t"
/// ```
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfig {
    pub base_url: String,
    pub namespace: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl SessionConfig {
    #[must_use]
    pub fn new(base_url: impl ToString, namespace: impl ToString) -> Self {
        Self {
            base_url: base_url.to_string(),
            namespace: namespace.to_string(),
            token: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `s` is not a valid
    /// session config.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read and
    /// [`Error::Config`](crate::Error::Config) if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config_file = std::fs::read_to_string(path)?;
        Self::from_toml_str(&config_file)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that propagate out of a session call.
///
/// A response body that is not valid JSON is only surfaced as [`Error::Decode`]
/// by the strict `*_json` operations. The lenient operations log it and return
/// an absent value instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid value for header `{name}`")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
    #[error("invalid session config: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

//! Resolution error types.

use thiserror::Error;

/// Failure to obtain or read upstream release metadata.
///
/// Any of these aborts the whole run: there is no partial resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid release metadata URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported release metadata URL scheme `{scheme}` in `{url}`")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("failed to fetch release metadata from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read release metadata from {url}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch latest release from {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to parse release metadata from {url}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid asset pattern")]
    Pattern(#[from] regex::Error),
}

//! Release metadata fetched from a URL.
//!
//! `http(s)://` URLs are fetched with a blocking reqwest client. `file://`
//! URLs read a saved copy of the API response, which lets pookie run against
//! a mirrored or pinned release without network access.

use url::Url;

use crate::sources::errors::ResolveError;
use crate::sources::source::{Release, ReleaseSource};

/// GitHub API endpoint for the latest python-build-standalone release.
pub const DEFAULT_RELEASE_URL: &str =
    "https://api.github.com/repos/astral-sh/python-build-standalone/releases/latest";

const USER_AGENT: &str = concat!("pookie/", env!("CARGO_PKG_VERSION"));

/// Release metadata at a remote (or `file://`) location.
#[derive(Debug, Clone)]
pub struct RemoteReleaseSource {
    url: String,
}

impl RemoteReleaseSource {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteReleaseSource { url: url.into() }
    }

    fn fetch_http(&self, url: &Url) -> Result<String, ResolveError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| ResolveError::Fetch {
                url: self.url.clone(),
                source,
            })?;

        let response = client
            .get(url.as_str())
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|source| ResolveError::Fetch {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(|source| ResolveError::Fetch {
            url: self.url.clone(),
            source,
        })
    }

    fn read_file(&self, url: &Url) -> Result<String, ResolveError> {
        let path = url
            .to_file_path()
            .map_err(|_| ResolveError::UnsupportedScheme {
                url: self.url.clone(),
                scheme: url.scheme().to_string(),
            })?;

        std::fs::read_to_string(&path).map_err(|source| ResolveError::Read {
            url: self.url.clone(),
            source,
        })
    }
}

impl Default for RemoteReleaseSource {
    fn default() -> Self {
        RemoteReleaseSource::new(DEFAULT_RELEASE_URL)
    }
}

impl ReleaseSource for RemoteReleaseSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn latest_release(&self) -> Result<Release, ResolveError> {
        let url = Url::parse(&self.url).map_err(|source| ResolveError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        tracing::debug!("Fetching release metadata from {}", url);

        let body = match url.scheme() {
            "http" | "https" => self.fetch_http(&url)?,
            "file" => self.read_file(&url)?,
            other => {
                return Err(ResolveError::UnsupportedScheme {
                    url: self.url.clone(),
                    scheme: other.to_string(),
                })
            }
        };

        Release::from_json(&self.url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_url_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latest.json");
        std::fs::write(&path, r#"{"tag_name": "20240713", "assets": []}"#).unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let source = RemoteReleaseSource::new(url.as_str());
        let release = source.latest_release().unwrap();
        assert_eq!(release.tag_name, "20240713");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let url = Url::from_file_path(tmp.path().join("nope.json")).unwrap();
        let err = RemoteReleaseSource::new(url.as_str())
            .latest_release()
            .unwrap_err();
        assert!(matches!(err, ResolveError::Read { .. }));
    }

    #[test]
    fn test_invalid_url() {
        let err = RemoteReleaseSource::new("not a url").latest_release().unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { .. }));
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = RemoteReleaseSource::new("ftp://example.invalid/latest.json")
            .latest_release()
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedScheme { .. }));
    }
}

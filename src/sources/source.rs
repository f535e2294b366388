//! ReleaseSource trait - common interface for runtime release metadata.

use serde::Deserialize;

use crate::sources::errors::ResolveError;

/// A published upstream release and its downloadable assets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A single downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Parse release metadata as returned by the GitHub releases API.
    pub fn from_json(origin: &str, body: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(body).map_err(|source| ResolveError::Parse {
            url: origin.to_string(),
            source,
        })
    }
}

/// A source of release metadata.
pub trait ReleaseSource {
    /// Human-readable location, used in messages.
    fn location(&self) -> &str;

    /// Fetch the latest release. Called once per run.
    fn latest_release(&self) -> Result<Release, ResolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_from_json_ignores_extra_fields() {
        let body = r#"{
            "tag_name": "20240713",
            "name": "20240713",
            "assets": [
                {"name": "a.tar.gz", "browser_download_url": "https://example.invalid/a", "size": 10}
            ]
        }"#;
        let release = Release::from_json("test", body).unwrap();
        assert_eq!(release.tag_name, "20240713");
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].name, "a.tar.gz");
    }

    #[test]
    fn test_release_without_assets() {
        let release = Release::from_json("test", r#"{"tag_name": "v1"}"#).unwrap();
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_release_malformed() {
        let err = Release::from_json("test", "not json").unwrap_err();
        assert!(matches!(err, ResolveError::Parse { .. }));
    }
}

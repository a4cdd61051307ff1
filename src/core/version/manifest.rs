// ─── Version Manifest ───
// Handles fetching and parsing the global version index.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::core::config::AcquireConfig;
use crate::core::error::{AcquireError, AcquireResult};

pub const LATEST_RELEASE: &str = "latest-release";
pub const LATEST_SNAPSHOT: &str = "latest-snapshot";

/// Top-level version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub release_time: Option<DateTime<Utc>>,
}

impl VersionManifest {
    /// One GET of the configured manifest URL. No retry.
    pub async fn fetch(client: &reqwest::Client, config: &AcquireConfig) -> AcquireResult<Self> {
        info!("Fetching version manifest from {}", config.manifest_url);

        let response = client.get(&config.manifest_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::DownloadFailed {
                url: config.manifest_url.clone(),
                status: status.as_u16(),
            });
        }
        let manifest: VersionManifest = response.json().await?;

        info!(
            "Loaded {} versions from manifest (latest release {})",
            manifest.versions.len(),
            manifest.latest.release
        );
        Ok(manifest)
    }

    /// Find a specific version entry by exact ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Map the `latest-release` / `latest-snapshot` aliases onto real ids.
    pub fn resolve_id<'a>(&'a self, requested: &'a str) -> AcquireResult<&'a str> {
        match requested {
            LATEST_RELEASE => Ok(&self.latest.release),
            LATEST_SNAPSHOT => self
                .latest
                .snapshot
                .as_deref()
                .ok_or_else(|| AcquireError::VersionNotFound(requested.to_string())),
            id => Ok(id),
        }
    }

    /// List all release-type versions in manifest order.
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type.as_deref() == Some("release"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample() -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "latest": { "release": "1.20.4", "snapshot": "24w03a" },
            "versions": [
                { "id": "24w03a", "type": "snapshot", "url": "https://example.com/s.json" },
                {
                    "id": "1.20.4",
                    "type": "release",
                    "url": "https://example.com/1.20.4.json",
                    "sha1": "abc123",
                    "releaseTime": "2023-12-07T12:56:20+00:00"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserialize_manifest_entry() {
        let manifest = sample();
        let entry = manifest.find_version("1.20.4").unwrap();
        assert_eq!(entry.version_type.as_deref(), Some("release"));
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
        assert!(entry.release_time.is_some());
    }

    #[test]
    fn lookup_is_exact_match() {
        let manifest = sample();
        assert!(manifest.find_version("1.20").is_none());
        assert!(manifest.find_version("1.20.4 ").is_none());
    }

    #[test]
    fn latest_aliases_resolve() {
        let manifest = sample();
        assert_eq!(manifest.resolve_id(LATEST_RELEASE).unwrap(), "1.20.4");
        assert_eq!(manifest.resolve_id(LATEST_SNAPSHOT).unwrap(), "24w03a");
        assert_eq!(manifest.resolve_id("1.8.9").unwrap(), "1.8.9");
        assert_eq!(manifest.releases().len(), 1);
    }

    #[tokio::test]
    async fn fetch_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = AcquireConfig::with_data_dir("unused");
        config.manifest_url = format!("{}/manifest.json", server.uri());

        let err = VersionManifest::fetch(&reqwest::Client::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquireError::DownloadFailed { status: 503, .. }));
    }
}

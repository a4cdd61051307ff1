// ─── Version File ───
// Parses a version descriptor and selects libraries for a platform.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::acquire::GameLayout;
use crate::core::downloader::{hashes_match, Sha1Accumulator};
use crate::core::error::{AcquireError, AcquireResult};
use crate::core::platform::{OsFamily, PlatformDescriptor, LEGACY_MACOS_NAME};
use crate::core::version::manifest::VersionManifest;
use crate::core::version::rules::{self, legacy_classifier_key, native_classifier_key, LibraryRule};

/// A fully parsed version descriptor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    pub main_class: String,
    pub downloads: VersionDownloads,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub asset_index: AssetIndexInfo,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: DownloadArtifact,
    #[serde(default)]
    pub client_mappings: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<LibraryRule>,
    /// Legacy `{ "<os>": "natives-<os>[-${arch}]" }` map.
    #[serde(default)]
    pub natives: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, LibraryArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryArtifact {
    pub path: String,
    pub sha1: String,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

impl LibraryEntry {
    pub fn applies_to(&self, platform: &PlatformDescriptor) -> bool {
        rules::applies(&self.rules, platform)
    }

    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Classifier artifact holding this library's natives for `platform`.
    ///
    /// Tries `natives-<os><arch>`, then on macOS `natives-osx<arch>`, then the
    /// legacy `natives` map. `None` means there is no native component.
    pub fn native_classifier(&self, platform: &PlatformDescriptor) -> Option<&LibraryArtifact> {
        let classifiers = &self.downloads.as_ref()?.classifiers;
        if classifiers.is_empty() {
            return None;
        }

        if let Some(found) = classifiers.get(&native_classifier_key(platform)) {
            return Some(found);
        }
        if platform.os_family == OsFamily::MacOs {
            if let Some(found) = classifiers.get(&legacy_classifier_key(platform)) {
                return Some(found);
            }
        }

        let key = self.legacy_natives_key(platform)?;
        classifiers.get(&key)
    }

    fn legacy_natives_key(&self, platform: &PlatformDescriptor) -> Option<String> {
        let natives = self.natives.as_ref()?;
        let template = natives.get(platform.os_family.as_str()).or_else(|| {
            (platform.os_family == OsFamily::MacOs)
                .then(|| natives.get(LEGACY_MACOS_NAME))
                .flatten()
        })?;
        // Replace ${arch} with the pointer width the legacy format expects
        let arch = if platform.arch_suffix == "-x86" { "32" } else { "64" };
        Some(template.replace("${arch}", arch))
    }

    /// Whether the direct artifact itself is a natives archive for `platform`
    /// (`group:name:version:natives-<os><arch>` coordinates).
    pub fn is_native_artifact(&self, platform: &PlatformDescriptor) -> bool {
        let Some(classifier) = self.name.rsplit(':').next() else {
            return false;
        };
        classifier == native_classifier_key(platform)
            || (platform.os_family == OsFamily::MacOs
                && classifier == legacy_classifier_key(platform))
    }
}

impl VersionDescriptor {
    pub fn from_json(raw: &str) -> AcquireResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Resolve `id` through `manifest`, fetch its descriptor and persist the
    /// raw document to the layout's cache path before returning it.
    ///
    /// An id missing from the manifest fails without any request.
    pub async fn fetch_for(
        id: &str,
        manifest: &VersionManifest,
        client: &reqwest::Client,
        layout: &GameLayout,
    ) -> AcquireResult<Self> {
        let entry = manifest
            .find_version(id)
            .ok_or_else(|| AcquireError::VersionNotFound(id.to_string()))?;

        info!("Fetching descriptor for {} from {}", id, entry.url);
        let response = client.get(&entry.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::DownloadFailed {
                url: entry.url.clone(),
                status: status.as_u16(),
            });
        }
        // hash the bytes as served; `text()` may re-decode them by charset
        let body = response.bytes().await?;

        if let Some(expected) = entry.sha1.as_deref() {
            let mut acc = Sha1Accumulator::new();
            acc.update(&body);
            let actual = acc.finish();
            if !hashes_match(expected, &actual) {
                return Err(AcquireError::Sha1Mismatch {
                    path: layout.descriptor_path(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let raw = std::str::from_utf8(&body).map_err(|e| {
            AcquireError::Other(format!("Descriptor for {} is not UTF-8: {}", id, e))
        })?;
        let descriptor = Self::from_json(raw)?;
        Self::save_to(raw, layout).await?;
        Ok(descriptor)
    }

    /// Save the raw descriptor to `<root>/<id>.json`.
    pub async fn save_to(raw_json: &str, layout: &GameLayout) -> AcquireResult<()> {
        let path = layout.descriptor_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AcquireError::io(parent, e))?;
        }
        tokio::fs::write(&path, raw_json)
            .await
            .map_err(|e| AcquireError::io(&path, e))?;
        debug!("Saved descriptor to {:?}", path);
        Ok(())
    }

    /// Load a descriptor persisted by an earlier run.
    pub async fn load_cached(layout: &GameLayout) -> AcquireResult<Self> {
        let path = layout.descriptor_path();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AcquireError::io(&path, e))?;
        Self::from_json(&raw)
    }

    /// Libraries whose rules admit `platform`, in declared order.
    pub fn applicable_libraries<'a>(
        &'a self,
        platform: &'a PlatformDescriptor,
    ) -> impl Iterator<Item = &'a LibraryEntry> + 'a {
        self.libraries.iter().filter(move |lib| lib.applies_to(platform))
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::core::downloader::{is_sha1_hex, DownloadTask};
use crate::core::error::{AcquireError, AcquireResult};

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

/// Fetches planned from an index, plus the names refused for a hash that is
/// not a SHA-1 digest.
#[derive(Debug, Default)]
pub struct AssetTasks {
    pub tasks: Vec<DownloadTask>,
    pub malformed: Vec<String>,
}

impl AssetObject {
    /// Present only when the hash is a full hex digest, so it is safe as a
    /// path component.
    fn prefix(&self) -> Option<&str> {
        if !is_sha1_hex(&self.hash) {
            return None;
        }
        self.hash.get(..2)
    }

    /// `objects/<hash[0:2]>/<hash>`; never derived from the logical name.
    pub fn object_path(&self, objects_dir: &Path) -> Option<PathBuf> {
        Some(objects_dir.join(self.prefix()?).join(&self.hash))
    }

    pub fn url(&self, resources_url: &str) -> Option<String> {
        Some(format!(
            "{}/{}/{}",
            resources_url.trim_end_matches('/'),
            self.prefix()?,
            self.hash
        ))
    }
}

impl AssetIndex {
    pub async fn load(path: &Path) -> AcquireResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AcquireError::io(path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// One task per distinct object hash.
    ///
    /// Names sharing a hash collapse into a single fetch of a single file.
    /// Objects whose hash is not 40 hex digits get no task.
    pub fn download_tasks(&self, objects_dir: &Path, resources_url: &str) -> AssetTasks {
        let mut seen = BTreeSet::new();
        let mut planned = AssetTasks::default();

        for (name, obj) in &self.objects {
            let (Some(dest), Some(url)) = (obj.object_path(objects_dir), obj.url(resources_url))
            else {
                warn!("Skipping asset {} with malformed hash {:?}", name, obj.hash);
                planned.malformed.push(name.clone());
                continue;
            };
            if !seen.insert(obj.hash.to_ascii_lowercase()) {
                continue;
            }
            planned
                .tasks
                .push(DownloadTask::new(url, Some(obj.hash.clone()), dest, name.as_str()));
        }

        let total = planned.tasks.len();
        for (i, task) in planned.tasks.iter_mut().enumerate() {
            task.label = format!("Asset Object: {} / {} ({})", i + 1, total, task.label);
        }
        planned
    }
}

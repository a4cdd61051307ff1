// ─── Acquisition Config ───
// Immutable run configuration, built once and passed by reference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::AcquireResult;
use crate::core::http::build_http_client;
use crate::core::platform::PlatformDescriptor;

const APP_DIR_NAME: &str = "ArtifactAcquire";
const SETTINGS_FILE: &str = "acquire_settings.json";

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AcquireConfig {
    pub data_dir: PathBuf,
    pub manifest_url: String,
    pub resources_url: String,
    /// Maximum number of parallel downloads.
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub platform: PlatformDescriptor,
    /// Also fetch `downloads.client_mappings` when the descriptor has one.
    pub with_mappings: bool,
}

/// Optional overrides persisted next to the downloaded data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquireSettings {
    #[serde(default)]
    pub manifest_url: Option<String>,
    #[serde(default)]
    pub resources_url: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    #[serde(default)]
    pub with_mappings: Option<bool>,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

impl AcquireConfig {
    /// Built-in defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            manifest_url: VERSION_MANIFEST_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            platform: PlatformDescriptor::detect(),
            with_mappings: false,
        }
    }

    /// Defaults, then the settings file inside `data_dir` if one exists.
    pub fn load(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::with_data_dir(data_dir);
        if let Some(settings) = load_settings_from_disk(&config.data_dir) {
            config.apply_settings(&settings);
        }
        config
    }

    pub fn apply_settings(&mut self, settings: &AcquireSettings) {
        if let Some(url) = &settings.manifest_url {
            self.manifest_url = url.clone();
        }
        if let Some(url) = &settings.resources_url {
            self.resources_url = url.clone();
        }
        if let Some(n) = settings.concurrency {
            self.concurrency = n.max(1);
        }
        if let Some(secs) = settings.connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = settings.read_timeout_secs {
            self.read_timeout = Duration::from_secs(secs);
        }
        if let Some(flag) = settings.with_mappings {
            self.with_mappings = flag;
        }
    }

    pub fn http_client(&self) -> AcquireResult<Client> {
        Ok(build_http_client(self.connect_timeout, self.read_timeout)?)
    }
}

fn load_settings_from_disk(data_dir: &Path) -> Option<AcquireSettings> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring unreadable settings file {:?}: {}", path, e);
            None
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

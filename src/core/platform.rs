// ─── Platform Descriptor ───
// Host OS family + architecture suffix, resolved once at startup.

use std::fmt;
use std::str::FromStr;

use crate::core::error::AcquireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
}

/// Name older descriptors use for macOS in rules and classifier keys.
pub const LEGACY_MACOS_NAME: &str = "osx";

impl OsFamily {
    /// Manifest name used in classifier keys (`natives-<name>`).
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
        }
    }

    /// Whether a rule's `os.name` targets this family.
    pub fn matches_name(&self, name: &str) -> bool {
        name == self.as_str() || (*self == OsFamily::MacOs && name == LEGACY_MACOS_NAME)
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = AcquireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(OsFamily::Windows),
            "linux" => Ok(OsFamily::Linux),
            "macos" | LEGACY_MACOS_NAME => Ok(OsFamily::MacOs),
            other => Err(AcquireError::Other(format!("Unknown OS family: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub os_family: OsFamily,
    /// Appended to classifier keys, e.g. `""` for x86_64 or `"-arm64"`.
    pub arch_suffix: String,
}

impl PlatformDescriptor {
    pub fn new(os_family: OsFamily, arch_suffix: impl Into<String>) -> Self {
        Self {
            os_family,
            arch_suffix: arch_suffix.into(),
        }
    }

    /// Describe the host this binary was compiled for.
    pub fn detect() -> Self {
        let os_family = if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        };

        Self::new(os_family, host_arch_suffix())
    }
}

fn host_arch_suffix() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        "-arm64"
    } else if cfg!(target_arch = "x86") {
        "-x86"
    } else {
        ""
    }
}

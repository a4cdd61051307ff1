// ─── Launch Inputs ───
// Paths and identifiers a process launcher needs, derived from the
// descriptor and the populated layout.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::acquire::GameLayout;
use crate::core::platform::{OsFamily, PlatformDescriptor};
use crate::core::version::VersionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInputs {
    pub version_id: String,
    pub main_class: String,
    pub asset_index_id: String,
    pub assets_dir: PathBuf,
    pub natives_dir: PathBuf,
    /// Library jars in declared order, followed by the client jar.
    pub classpath: Vec<PathBuf>,
    /// Family the inputs were resolved for; picks the classpath separator.
    pub os_family: OsFamily,
}

impl LaunchInputs {
    pub fn new(
        descriptor: &VersionDescriptor,
        layout: &GameLayout,
        platform: &PlatformDescriptor,
    ) -> Self {
        let mut classpath: Vec<PathBuf> = descriptor
            .applicable_libraries(platform)
            .filter(|lib| !lib.is_native_artifact(platform))
            .filter_map(|lib| lib.artifact())
            .filter_map(|artifact| layout.library_path(&artifact.path))
            .collect();
        dedup_preserving_order(&mut classpath);
        classpath.push(layout.client_jar());

        Self {
            version_id: descriptor.id.clone(),
            main_class: descriptor.main_class.clone(),
            asset_index_id: descriptor.asset_index.id.clone(),
            assets_dir: layout.assets_dir(),
            natives_dir: layout.natives_dir(),
            classpath,
            os_family: platform.os_family,
        }
    }

    /// Classpath joined with the target platform's separator.
    pub fn classpath_string(&self) -> String {
        self.classpath
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(get_classpath_separator(self.os_family))
    }
}

/// Java classpath separator for `os`.
pub fn get_classpath_separator(os: OsFamily) -> &'static str {
    match os {
        OsFamily::Windows => ";",
        OsFamily::Linux | OsFamily::MacOs => ":",
    }
}

fn dedup_preserving_order(entries: &mut Vec<PathBuf>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.clone()));
}

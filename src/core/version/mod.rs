pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{LatestVersions, VersionEntry, VersionManifest, LATEST_RELEASE, LATEST_SNAPSHOT};
pub use rules::{applies, native_classifier_key, LibraryRule, OsRule, RuleAction};
pub use version_file::{
    AssetIndexInfo, DownloadArtifact, LibraryArtifact, LibraryDownloads, LibraryEntry,
    VersionDescriptor, VersionDownloads,
};

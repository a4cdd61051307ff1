use std::path::{Component, Path, PathBuf};

use crate::core::error::{AcquireError, AcquireResult};

/// On-disk layout for one version id, rooted at `<data_dir>/<version_id>`.
#[derive(Debug, Clone)]
pub struct GameLayout {
    root: PathBuf,
    version_id: String,
}

impl GameLayout {
    pub fn new(data_dir: impl AsRef<Path>, version_id: impl Into<String>) -> Self {
        let version_id = version_id.into();
        Self {
            root: data_dir.as_ref().join(&version_id),
            version_id,
        }
    }

    /// Like [`GameLayout::new`], but rejects an id that would not be a single
    /// directory inside `data_dir`.
    pub fn checked(data_dir: impl AsRef<Path>, version_id: &str) -> AcquireResult<Self> {
        let mut components = Path::new(version_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(Self::new(data_dir, version_id)),
            _ => Err(AcquireError::UnsafePath(version_id.to_string())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.version_id))
    }

    fn client_dir(&self) -> PathBuf {
        self.root.join("client")
    }

    pub fn client_jar(&self) -> PathBuf {
        self.client_dir()
            .join("JAR")
            .join(format!("{}.jar", self.version_id))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.client_dir().join("JAR").join("libraries")
    }

    /// Destination of a library's descriptor `path`, or `None` if it would
    /// land outside the libraries directory.
    pub fn library_path(&self, relative: &str) -> Option<PathBuf> {
        enclosed_path(&self.libraries_dir(), relative)
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.client_dir().join("natives")
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.client_dir()
            .join("mappings")
            .join(format!("{}.txt", self.version_id))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index_path(&self, asset_id: &str) -> Option<PathBuf> {
        enclosed_path(
            &self.assets_dir().join("indexes"),
            &format!("{}.json", asset_id),
        )
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }
}

/// Join `relative` onto `base` only when every component is a plain name
/// (or `.`) and at least one is a name. Absolute paths, drive prefixes and
/// `..` are refused.
pub fn enclosed_path(base: &Path, relative: &str) -> Option<PathBuf> {
    let mut named = false;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(_) => named = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    named.then(|| base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_versioned_layout() {
        let layout = GameLayout::new("/data", "1.20.4");
        let root = Path::new("/data/1.20.4");
        assert_eq!(layout.descriptor_path(), root.join("1.20.4.json"));
        assert_eq!(layout.client_jar(), root.join("client/JAR/1.20.4.jar"));
        assert_eq!(layout.libraries_dir(), root.join("client/JAR/libraries"));
        assert_eq!(
            layout.library_path("org/lwjgl/lwjgl.jar"),
            Some(root.join("client/JAR/libraries/org/lwjgl/lwjgl.jar"))
        );
        assert_eq!(layout.natives_dir(), root.join("client/natives"));
        assert_eq!(
            layout.asset_index_path("12"),
            Some(root.join("assets/indexes/12.json"))
        );
        assert_eq!(layout.objects_dir(), root.join("assets/objects"));
    }

    #[test]
    fn remote_paths_cannot_escape() {
        let layout = GameLayout::new("/data", "1.0");
        assert_eq!(layout.library_path("/etc/passwd"), None);
        assert_eq!(layout.library_path("../../../../victim.txt"), None);
        assert_eq!(layout.library_path("org/../../x.jar"), None);
        assert_eq!(layout.library_path(""), None);
        assert_eq!(layout.asset_index_path("../../../victim"), None);
        assert!(layout.library_path("./org/a.jar").is_some());
    }

    #[test]
    fn version_id_must_be_one_directory() {
        assert!(GameLayout::checked("/data", "1.20.4").is_ok());
        for id in ["../outside", "/abs", "a/b", "", ".."] {
            let err = GameLayout::checked("/data", id).unwrap_err();
            assert!(matches!(err, AcquireError::UnsafePath(_)), "{id}");
        }
    }
}

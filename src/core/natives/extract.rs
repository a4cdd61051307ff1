use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{AcquireError, AcquireResult};

/// Packaging metadata never copied out of a natives archive.
const METADATA_PREFIX: &str = "META-INF/";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub archives: usize,
    pub files: usize,
}

/// Unpack every archive into `dest`, preserving relative paths and
/// overwriting existing files. Entries under `META-INF/` and entries whose
/// path would escape `dest` are skipped.
pub async fn extract_natives(
    archives: Vec<PathBuf>,
    dest: PathBuf,
) -> AcquireResult<ExtractSummary> {
    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&dest).map_err(|e| AcquireError::io(&dest, e))?;

        let mut summary = ExtractSummary::default();
        for archive in &archives {
            let files = extract_archive(archive, &dest)?;
            info!("Extracted {} native files from {:?}", files, archive);
            summary.archives += 1;
            summary.files += files;
        }
        Ok(summary)
    })
    .await
    .map_err(|e| AcquireError::Other(format!("Task join error: {}", e)))?
}

fn extract_archive(archive_path: &Path, dest: &Path) -> AcquireResult<usize> {
    let file = File::open(archive_path).map_err(|e| AcquireError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.name().starts_with(METADATA_PREFIX) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            debug!("Skipping unsafe entry {:?} in {:?}", entry.name(), archive_path);
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| AcquireError::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AcquireError::io(parent, e))?;
        }

        let mut out = File::create(&target).map_err(|e| AcquireError::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| AcquireError::io(&target, e))?;
        debug!("Extracted native: {:?}", target);
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) fn write_test_jar(path: &Path, entries: &[(&str, &str)]) {
    use std::io::Write;

    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

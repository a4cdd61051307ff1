// ─── Acquisition Orchestrator ───
// Main artifact → libraries → asset index → asset objects → natives.

use std::collections::HashSet;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::acquire::GameLayout;
use crate::core::assets::AssetIndex;
use crate::core::config::AcquireConfig;
use crate::core::downloader::{BatchReport, DownloadTask, Downloader, FetchOutcome};
use crate::core::error::{AcquireError, AcquireResult};
use crate::core::launch::LaunchInputs;
use crate::core::natives::{extract_natives, ExtractSummary};
use crate::core::version::{VersionDescriptor, VersionManifest, LATEST_RELEASE, LATEST_SNAPSHOT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Number of non-fatal artifacts that could not be acquired.
    PartialSuccess(usize),
}

#[derive(Debug)]
pub struct AcquisitionReport {
    pub outcome: Outcome,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub natives: ExtractSummary,
    pub inputs: LaunchInputs,
}

#[derive(Debug, Default)]
struct Tally {
    downloaded: usize,
    skipped: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::AlreadyValid => self.skipped += 1,
            FetchOutcome::Downloaded { .. } => self.downloaded += 1,
        }
    }

    fn absorb(&mut self, report: &BatchReport) {
        self.downloaded += report.downloaded();
        self.skipped += report.skipped();
        self.failed += report.failed.len();
    }
}

/// Library downloads plus the destinations that hold natives.
struct LibraryPlan {
    tasks: Vec<DownloadTask>,
    natives: HashSet<PathBuf>,
    /// Artifacts whose descriptor path would leave the libraries directory.
    rejected: usize,
}

pub struct Acquisition<'a> {
    config: &'a AcquireConfig,
    downloader: &'a Downloader,
}

impl<'a> Acquisition<'a> {
    pub fn new(config: &'a AcquireConfig, downloader: &'a Downloader) -> Self {
        Self { config, downloader }
    }

    /// Acquire everything `descriptor` needs into `layout`.
    ///
    /// Only the main artifact and the asset index are fatal; every other
    /// failure is logged and counted into `Outcome::PartialSuccess`.
    pub async fn run(
        &self,
        descriptor: &VersionDescriptor,
        layout: &GameLayout,
        cancel: &CancellationToken,
    ) -> AcquireResult<AcquisitionReport> {
        let mut tally = Tally::default();

        // 1. Main artifact
        let client = &descriptor.downloads.client;
        let main = DownloadTask::new(
            &client.url,
            Some(client.sha1.clone()),
            layout.client_jar(),
            format!("Client JAR {}", descriptor.id),
        );
        tally.record(self.fetch_required(&main, cancel).await?);

        // 2. Optional mappings
        if self.config.with_mappings {
            if let Some(mappings) = &descriptor.downloads.client_mappings {
                let task = DownloadTask::new(
                    &mappings.url,
                    Some(mappings.sha1.clone()),
                    layout.mappings_path(),
                    "Client Mappings",
                );
                match self.downloader.fetch(&task, cancel).await {
                    Ok(outcome) => tally.record(outcome),
                    Err(e) => {
                        warn!("{} failed: {}", task.label, e);
                        tally.failed += 1;
                    }
                }
            }
        }
        ensure_not_cancelled(cancel)?;

        // 3. Libraries and their native classifiers
        let plan = self.plan_libraries(descriptor, layout);
        info!(
            "Processing {} libraries ({} tasks, {} native archives)",
            descriptor.libraries.len(),
            plan.tasks.len(),
            plan.natives.len()
        );
        tally.failed += plan.rejected;
        let libraries = self.downloader.fetch_all(plan.tasks, cancel).await;
        tally.absorb(&libraries);
        let native_archives: Vec<PathBuf> = libraries
            .succeeded
            .iter()
            .map(|(task, _)| &task.dest)
            .filter(|dest| plan.natives.contains(*dest))
            .cloned()
            .collect();
        ensure_not_cancelled(cancel)?;

        // 4. Asset index, then every object it names
        let index_info = &descriptor.asset_index;
        let index_path = layout.asset_index_path(&index_info.id).ok_or_else(|| {
            error!("Asset index id {:?} is not a plain name, aborting run", index_info.id);
            AcquireError::UnsafePath(index_info.id.clone())
        })?;
        let index_task = DownloadTask::new(
            &index_info.url,
            index_info.sha1.clone(),
            &index_path,
            format!("Asset Index: {}", index_info.id),
        );
        tally.record(self.fetch_required(&index_task, cancel).await?);
        let index = AssetIndex::load(&index_path).await?;

        let planned = index.download_tasks(&layout.objects_dir(), &self.config.resources_url);
        info!(
            "Downloading {} asset objects ({} names in index)",
            planned.tasks.len(),
            index.objects.len()
        );
        tally.failed += planned.malformed.len();
        let assets = self.downloader.fetch_all(planned.tasks, cancel).await;
        tally.absorb(&assets);
        ensure_not_cancelled(cancel)?;

        // 5. Natives from the archives verified in step 3
        let natives = if native_archives.is_empty() {
            ExtractSummary::default()
        } else {
            match extract_natives(native_archives, layout.natives_dir()).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("Native extraction failed: {}", e);
                    tally.failed += 1;
                    ExtractSummary::default()
                }
            }
        };

        let outcome = if tally.failed == 0 {
            Outcome::Success
        } else {
            Outcome::PartialSuccess(tally.failed)
        };
        info!(
            "Acquisition of {} finished: {} downloaded, {} already valid, {} failed",
            descriptor.id, tally.downloaded, tally.skipped, tally.failed
        );

        Ok(AcquisitionReport {
            outcome,
            downloaded: tally.downloaded,
            skipped: tally.skipped,
            failed: tally.failed,
            natives,
            inputs: LaunchInputs::new(descriptor, layout, &self.config.platform),
        })
    }

    async fn fetch_required(
        &self,
        task: &DownloadTask,
        cancel: &CancellationToken,
    ) -> AcquireResult<FetchOutcome> {
        self.downloader.fetch(task, cancel).await.map_err(|e| {
            error!("{} failed, aborting run: {}", task.label, e);
            e
        })
    }

    fn plan_libraries(&self, descriptor: &VersionDescriptor, layout: &GameLayout) -> LibraryPlan {
        let platform = &self.config.platform;
        let total = descriptor.libraries.len();
        let mut seen = HashSet::new();
        let mut plan = LibraryPlan {
            tasks: Vec::new(),
            natives: HashSet::new(),
            rejected: 0,
        };

        for (i, lib) in descriptor.libraries.iter().enumerate() {
            if !lib.applies_to(platform) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }
            let label = format!("Library: {} / {} ({})", i + 1, total, lib.name);

            let mut wanted = Vec::with_capacity(2);
            if let Some(artifact) = lib.artifact() {
                wanted.push((artifact, label.clone(), lib.is_native_artifact(platform)));
            }
            if let Some(native) = lib.native_classifier(platform) {
                wanted.push((native, format!("{label} natives"), true));
            }

            for (artifact, label, is_native) in wanted {
                let Some(dest) = layout.library_path(&artifact.path) else {
                    warn!("{} has unsafe path {:?}, skipping", label, artifact.path);
                    plan.rejected += 1;
                    continue;
                };
                if is_native {
                    plan.natives.insert(dest.clone());
                }
                if seen.insert(dest.clone()) {
                    plan.tasks.push(DownloadTask::new(
                        &artifact.url,
                        Some(artifact.sha1.clone()),
                        dest,
                        label,
                    ));
                }
            }
        }

        plan
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> AcquireResult<()> {
    if cancel.is_cancelled() {
        warn!("Acquisition cancelled");
        return Err(AcquireError::Cancelled);
    }
    Ok(())
}

/// Resolve `requested` (an id or a `latest-*` alias) and acquire it.
///
/// With `offline`, the descriptor persisted by an earlier run is used and
/// neither the manifest nor the descriptor is fetched.
pub async fn acquire_version(
    config: &AcquireConfig,
    requested: &str,
    offline: bool,
    cancel: &CancellationToken,
) -> AcquireResult<AcquisitionReport> {
    let downloader = Downloader::from_config(config)?;

    let (descriptor, layout) = if offline {
        if requested == LATEST_RELEASE || requested == LATEST_SNAPSHOT {
            return Err(AcquireError::Other(format!(
                "{requested} cannot be resolved offline, pass a version id"
            )));
        }
        let layout = GameLayout::checked(&config.data_dir, requested)?;
        (VersionDescriptor::load_cached(&layout).await?, layout)
    } else {
        let manifest = VersionManifest::fetch(downloader.client(), config).await?;
        let id = manifest.resolve_id(requested)?.to_string();
        let layout = GameLayout::checked(&config.data_dir, &id)?;
        let descriptor =
            VersionDescriptor::fetch_for(&id, &manifest, downloader.client(), &layout).await?;
        (descriptor, layout)
    };

    Acquisition::new(config, &downloader)
        .run(&descriptor, &layout, cancel)
        .await
}

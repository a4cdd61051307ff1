use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use artifact_acquire::core::config::default_data_dir;
use artifact_acquire::core::version::{VersionManifest, LATEST_RELEASE};
use artifact_acquire::{acquire_version, AcquireConfig, AcquireResult, OsFamily, Outcome};

#[derive(Parser)]
#[command(name = "acquire")]
#[command(about = "Download and verify every artifact a game version needs")]
struct Cli {
    /// Version id, or `latest-release` / `latest-snapshot`
    #[arg(default_value = LATEST_RELEASE)]
    version: String,

    /// Base directory; each version gets its own root inside it
    #[arg(long, env = "ACQUIRE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "ACQUIRE_MANIFEST_URL")]
    manifest_url: Option<String>,

    /// Host serving content-addressed asset objects
    #[arg(long, env = "ACQUIRE_RESOURCES_URL")]
    resources_url: Option<String>,

    /// Maximum parallel downloads
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Override the detected OS family (windows, linux, macos/osx)
    #[arg(long)]
    os: Option<String>,

    /// Override the detected classifier arch suffix (e.g. "-arm64")
    #[arg(long, allow_hyphen_values = true)]
    arch_suffix: Option<String>,

    /// Also fetch client obfuscation mappings
    #[arg(long)]
    mappings: bool,

    /// Reuse the descriptor cached by an earlier run instead of the manifest
    #[arg(long)]
    offline: bool,

    /// List release versions and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn into_config(self) -> AcquireResult<(AcquireConfig, String, bool, bool)> {
        let data_dir = self.data_dir.unwrap_or_else(default_data_dir);
        let mut config = AcquireConfig::load(data_dir);

        if let Some(url) = self.manifest_url {
            config.manifest_url = url;
        }
        if let Some(url) = self.resources_url {
            config.resources_url = url;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n.max(1);
        }
        if let Some(os) = self.os {
            config.platform.os_family = os.parse::<OsFamily>()?;
        }
        if let Some(suffix) = self.arch_suffix {
            config.platform.arch_suffix = suffix;
        }
        if self.mappings {
            config.with_mappings = true;
        }

        Ok((config, self.version, self.offline, self.list))
    }
}

async fn list_releases(config: &AcquireConfig) -> AcquireResult<()> {
    let manifest = VersionManifest::fetch(&config.http_client()?, config).await?;
    for entry in manifest.releases() {
        println!("{}", entry.id);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    artifact_acquire::init_tracing();

    let (config, version, offline, list) = match Cli::parse().into_config() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(1);
        }
    };

    if list {
        return match list_releases(&config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::from(1)
            }
        };
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight downloads...");
            on_interrupt.cancel();
        }
    });

    tracing::info!(
        "Acquiring {} into {:?} for {}{}",
        version,
        config.data_dir,
        config.platform.os_family,
        config.platform.arch_suffix
    );

    match acquire_version(&config, &version, offline, &cancel).await {
        Ok(report) => {
            println!(
                "{}: {} downloaded, {} already valid, {} failed",
                report.inputs.version_id, report.downloaded, report.skipped, report.failed
            );
            println!("main class:   {}", report.inputs.main_class);
            println!("asset index:  {}", report.inputs.asset_index_id);
            println!("natives dir:  {}", report.inputs.natives_dir.display());
            match report.outcome {
                Outcome::Success => ExitCode::SUCCESS,
                Outcome::PartialSuccess(_) => ExitCode::from(2),
            }
        }
        Err(e) => {
            tracing::error!("Acquisition failed ({:?}): {}", e.kind(), e);
            ExitCode::from(1)
        }
    }
}

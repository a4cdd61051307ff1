use std::path::{Path, PathBuf};

use futures_util::future;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::config::AcquireConfig;
use crate::core::downloader::hash::{hashes_match, verify_file, Sha1Accumulator};
use crate::core::error::{AcquireError, AcquireResult};

/// A single file to download with optional SHA-1 for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub expected_sha1: Option<String>,
    pub dest: PathBuf,
    /// Human-readable name used in logs.
    pub label: String,
}

impl DownloadTask {
    pub fn new(
        url: impl Into<String>,
        expected_sha1: Option<String>,
        dest: impl Into<PathBuf>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            expected_sha1,
            dest: dest.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already hashed to the expected value; no request issued.
    AlreadyValid,
    Downloaded { bytes: u64 },
}

/// Per-task results of a batch, in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(DownloadTask, FetchOutcome)>,
    pub failed: Vec<(DownloadTask, AcquireError)>,
    /// Tasks never started because the run was cancelled.
    pub not_started: usize,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.succeeded
            .iter()
            .filter(|(_, o)| matches!(o, FetchOutcome::Downloaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.succeeded
            .iter()
            .filter(|(_, o)| *o == FetchOutcome::AlreadyValid)
            .count()
    }
}

/// Concurrent, SHA-1 validated downloader.
pub struct Downloader {
    client: Client,
    /// Maximum number of parallel downloads.
    concurrency: usize,
}

impl Downloader {
    pub fn new(client: Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &AcquireConfig) -> AcquireResult<Self> {
        Ok(Self::new(config.http_client()?, config.concurrency))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    // ── Single file download ────────────────────────────

    /// Fetch `task.url` to `task.dest`.
    ///
    /// An existing destination that already matches the expected SHA-1 is
    /// kept without touching the network. Otherwise the body is streamed into
    /// a sibling `.part` file while hashing, and only renamed onto the
    /// destination once it verifies. A stale file that fails the pre-check is
    /// removed first, so a failed or mismatched fetch leaves nothing behind.
    pub async fn fetch(
        &self,
        task: &DownloadTask,
        cancel: &CancellationToken,
    ) -> AcquireResult<FetchOutcome> {
        if let Some(expected) = task.expected_sha1.as_deref() {
            if task.dest.is_file() {
                match verify_file(&task.dest, expected).await {
                    Ok(true) => {
                        debug!("Skipping {}: already exists and verified", task.label);
                        return Ok(FetchOutcome::AlreadyValid);
                    }
                    Ok(false) => debug!("{} exists but fails SHA-1, refetching", task.label),
                    Err(e) => debug!("{} unreadable ({}), refetching", task.label, e),
                }
                discard(&task.dest).await;
            }
        }

        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }

        if let Some(parent) = task.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AcquireError::io(parent, e))?;
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
            response = self.client.get(&task.url).send() => response?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::DownloadFailed {
                url: task.url.clone(),
                status: status.as_u16(),
            });
        }

        let part = part_path(&task.dest);
        let (actual, bytes) = match stream_to_file(response, &part, cancel).await {
            Ok(written) => written,
            Err(e) => {
                discard(&part).await;
                return Err(e);
            }
        };

        if let Some(expected) = task.expected_sha1.as_deref() {
            if !hashes_match(expected, &actual) {
                discard(&part).await;
                return Err(AcquireError::Sha1Mismatch {
                    path: task.dest.clone(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Err(e) = tokio::fs::rename(&part, &task.dest).await {
            discard(&part).await;
            return Err(AcquireError::io(&task.dest, e));
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", task.url, task.dest, bytes);
        Ok(FetchOutcome::Downloaded { bytes })
    }

    // ── Batch concurrent downloads ──────────────────────

    /// Run many tasks with at most `concurrency` in flight.
    ///
    /// Failures are collected, never propagated. Once `cancel` fires no
    /// further task is started.
    pub async fn fetch_all(
        &self,
        tasks: Vec<DownloadTask>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = tasks.len();
        info!(
            "Starting batch download: {} files, concurrency={}",
            total, self.concurrency
        );

        let results: Vec<_> = stream::iter(tasks)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|task| async move {
                let result = self.fetch(&task, cancel).await;
                (task, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport {
            not_started: total - results.len(),
            ..BatchReport::default()
        };
        for (task, result) in results {
            match result {
                Ok(outcome) => report.succeeded.push((task, outcome)),
                Err(e) => {
                    warn!("{} failed: {}", task.label, e);
                    report.failed.push((task, e));
                }
            }
        }
        report
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {:?}: {}", path, e);
        }
    }
}

async fn stream_to_file(
    response: reqwest::Response,
    part: &Path,
    cancel: &CancellationToken,
) -> AcquireResult<(String, u64)> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| AcquireError::io(part, e))?;
    let mut body = response.bytes_stream();
    let mut acc = Sha1Accumulator::new();
    let mut bytes = 0u64;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(AcquireError::Cancelled),
            next = body.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk?;
        acc.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| AcquireError::io(part, e))?;
        bytes += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| AcquireError::io(part, e))?;
    // handle must be closed before the rename on Windows
    drop(file);

    Ok((acc.finish(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::hash::sha1_hex;
    use crate::core::error::ErrorKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn downloader() -> Downloader {
        Downloader::new(Client::new(), 4)
    }

    fn task(server: &MockServer, route: &str, sha1: Option<String>, dest: PathBuf) -> DownloadTask {
        DownloadTask::new(format!("{}{}", server.uri(), route), sha1, dest, route)
    }

    #[tokio::test]
    async fn downloads_and_verifies_into_nested_dirs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lib.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("a/b/c/lib.jar");
        let t = task(&server, "/lib.jar", Some(sha1_hex(b"jar bytes")), dest.clone());

        let outcome = downloader().fetch(&t, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 9 });
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar bytes");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn verified_local_file_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .expect(0)
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("cached.bin");
        std::fs::write(&dest, b"cached").unwrap();
        let t = task(&server, "/cached.bin", Some(sha1_hex(b"cached")), dest);

        let outcome = downloader().fetch(&t, &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::AlreadyValid);
    }

    #[tokio::test]
    async fn corrupt_local_file_is_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obj"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"good".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("obj");
        std::fs::write(&dest, b"bit rot").unwrap();
        let t = task(&server, "/obj", Some(sha1_hex(b"good")), dest.clone());

        downloader().fetch(&t, &CancellationToken::new()).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"good");
    }

    #[tokio::test]
    async fn mismatch_leaves_no_file_behind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/obj"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("obj");
        std::fs::write(&dest, b"stale").unwrap();
        let t = task(&server, "/obj", Some(sha1_hex(b"expected")), dest.clone());

        let err = downloader().fetch(&t, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HashMismatch);
        assert!(!part_path(&dest).exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn error_status_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("missing");
        let t = task(&server, "/missing", None, dest.clone());

        let err = downloader().fetch(&t, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, AcquireError::DownloadFailed { status: 404, .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn unhashed_task_accepts_any_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(2)
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("index.json");
        let t = task(&server, "/index.json", None, dest.clone());
        let dl = downloader();
        let cancel = CancellationToken::new();

        dl.fetch(&t, &cancel).await.unwrap();
        // without a hash there is nothing to pre-check against
        dl.fetch(&t, &cancel).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "{}");
    }

    #[tokio::test]
    async fn timeout_is_a_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let temp = tempfile::tempdir().unwrap();
        let t = task(&server, "/slow", None, temp.path().join("slow"));

        let err = Downloader::new(client, 1)
            .fetch(&t, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn cancel_interrupts_request_awaiting_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("slow");
        let t = task(&server, "/slow", None, dest.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), downloader().fetch(&t, &cancel))
            .await
            .expect("fetch should stop once cancelled");
        assert!(matches!(result, Err(AcquireError::Cancelled)));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let mut tasks: Vec<_> = (0..5)
            .map(|i| {
                task(
                    &server,
                    &format!("/good{i}"),
                    Some(sha1_hex(b"ok")),
                    temp.path().join(format!("good{i}")),
                )
            })
            .collect();
        tasks.insert(2, task(&server, "/bad", None, temp.path().join("bad")));

        let report = downloader().fetch_all(tasks, &CancellationToken::new()).await;
        assert_eq!(report.succeeded.len(), 5);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.label, "/bad");
        assert_eq!(report.downloaded(), 5);
        assert_eq!(report.not_started, 0);
    }

    #[tokio::test]
    async fn cancelled_batch_starts_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let temp = tempfile::tempdir().unwrap();
        let tasks = vec![
            task(&server, "/a", None, temp.path().join("a")),
            task(&server, "/b", None, temp.path().join("b")),
        ];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = downloader().fetch_all(tasks, &cancel).await;
        assert_eq!(report.not_started, 2);
        assert!(report.succeeded.is_empty());
        assert!(report.failed.is_empty());
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the acquisition pipeline.
/// Every module returns `Result<T, AcquireError>`.
#[derive(Debug, Error)]
pub enum AcquireError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Resolution ──────────────────────────────────────
    #[error("Version {0} not found in manifest")]
    VersionNotFound(String),

    // ── Integrity ───────────────────────────────────────
    #[error("Refusing path {0:?} from remote document: escapes its directory")]
    UnsafePath(String),

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Acquisition cancelled")]
    Cancelled,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Coarse failure classes used for tallies and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    NotFound,
    HashMismatch,
    Io,
    Cancelled,
}

impl AcquireError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquireError::Http(_) | AcquireError::DownloadFailed { .. } => ErrorKind::Network,
            AcquireError::VersionNotFound(_) => ErrorKind::NotFound,
            AcquireError::Sha1Mismatch { .. } => ErrorKind::HashMismatch,
            AcquireError::Cancelled => ErrorKind::Cancelled,
            AcquireError::Io { .. }
            | AcquireError::Json(_)
            | AcquireError::Zip(_)
            | AcquireError::UnsafePath(_)
            | AcquireError::Other(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AcquireError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type AcquireResult<T> = Result<T, AcquireError>;

impl From<std::io::Error> for AcquireError {
    fn from(source: std::io::Error) -> Self {
        AcquireError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_failure_taxonomy() {
        let not_found = AcquireError::VersionNotFound("9.9".into());
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let status = AcquireError::DownloadFailed {
            url: "https://example.com/a".into(),
            status: 503,
        };
        assert_eq!(status.kind(), ErrorKind::Network);

        let mismatch = AcquireError::Sha1Mismatch {
            path: PathBuf::from("a.jar"),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(mismatch.kind(), ErrorKind::HashMismatch);

        let io = AcquireError::io("x", std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().contains("disk full"));
    }
}

use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::core::error::{AcquireError, AcquireResult};

const READ_CHUNK: usize = 64 * 1024;

/// Incremental SHA-1 fed one chunk at a time.
#[derive(Default)]
pub struct Sha1Accumulator {
    hasher: Sha1,
}

impl Sha1Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Lowercase hex digest.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Exactly 40 ASCII hex digits.
pub fn is_sha1_hex(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn hashes_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}

/// Stream a file through SHA-1 without loading it whole.
pub async fn hash_file(path: &Path) -> AcquireResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AcquireError::io(path, e))?;

    let mut acc = Sha1Accumulator::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| AcquireError::io(path, e))?;
        if n == 0 {
            break;
        }
        acc.update(&buf[..n]);
    }

    Ok(acc.finish())
}

/// Validate an existing file's SHA-1.
pub async fn verify_file(path: &Path, expected: &str) -> AcquireResult<bool> {
    let actual = hash_file(path).await?;
    Ok(hashes_match(expected, &actual))
}

#[cfg(test)]
pub(crate) fn sha1_hex(bytes: &[u8]) -> String {
    let mut acc = Sha1Accumulator::new();
    acc.update(bytes);
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha1("hello world")
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

    #[test]
    fn chunked_updates_equal_single_update() {
        let mut acc = Sha1Accumulator::new();
        acc.update(b"hello ");
        acc.update(b"world");
        assert_eq!(acc.finish(), HELLO_SHA1);
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(hashes_match(&HELLO_SHA1.to_uppercase(), HELLO_SHA1));
        assert!(!hashes_match("00", HELLO_SHA1));
    }

    #[test]
    fn sha1_hex_shape() {
        assert!(is_sha1_hex(HELLO_SHA1));
        assert!(is_sha1_hex(&HELLO_SHA1.to_uppercase()));
        assert!(!is_sha1_hex("2aae6c35"));
        assert!(!is_sha1_hex(&"g".repeat(40)));
        assert!(!is_sha1_hex("../../../../../../../../../../etc/passwd"));
    }

    #[tokio::test]
    async fn verify_file_reads_from_disk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("hello.txt");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        assert!(verify_file(&path, HELLO_SHA1).await.unwrap());
        assert!(!verify_file(&path, &sha1_hex(b"other")).await.unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = hash_file(&temp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, AcquireError::Io { .. }));
    }
}

pub mod client;
pub mod hash;

pub use client::{BatchReport, DownloadTask, Downloader, FetchOutcome};
pub use hash::{hash_file, hashes_match, is_sha1_hex, verify_file, Sha1Accumulator};

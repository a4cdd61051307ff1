use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("ArtifactAcquire/", env!("CARGO_PKG_VERSION"));

/// Shared client for every request of a run.
///
/// `identity` encoding keeps the streamed bytes equal to the published
/// checksums. Both timeouts surface as `reqwest::Error` on expiry.
pub fn build_http_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()
}

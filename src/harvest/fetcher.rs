//! HTTP fetcher implementation
//!
//! This module handles the HTTP side of a harvest:
//! - Building the shared HTTP client with user agent and timeouts
//! - Fetching single image artifacts and decoding them
//!
//! Nothing here retries. A failed artifact is reported once and the caller
//! decides whether to move on.

use crate::config::HttpConfig;
use crate::ArtifactError;
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;

/// Upper bound on connection setup, independent of the request timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (user agent, per-request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use specimen_harvest::config::HttpConfig;
/// use specimen_harvest::harvest::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads one image and decodes it
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Connection failure / timeout | `ArtifactError::Transport` |
/// | Non-2xx status | `ArtifactError::Status` |
/// | Body is not a decodable image | `ArtifactError::Decode` |
pub async fn fetch_artifact(client: &Client, url: &str) -> Result<DynamicImage, ArtifactError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| ArtifactError::Transport {
            url: url.to_string(),
            error,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ArtifactError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|error| ArtifactError::Transport {
            url: url.to_string(),
            error,
        })?;

    image::load_from_memory(&body).map_err(|error| ArtifactError::Decode {
        url: url.to_string(),
        error,
    })
}

//! Multi-strategy file download manager.
//!
//! Some storage providers reject modern cipher suites, some sit behind
//! redirecting CDNs, and some choke on HTTP/2. Each transport strategy
//! covers one of those failure classes; they are tried strictly in order.

use cram_config::DownloadConfig;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the download manager.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("All download strategies failed for {file_name} (last: {last}) [{}]", .reasons.join("; "))]
    Exhausted {
        file_name: String,
        last: String,
        reasons: Vec<String>,
    },
}

/// One transport strategy, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// rustls with TLS >= 1.2 and no redirect following.
    HardenedTls,
    /// Default client with redirect following.
    Standard,
    /// HTTP/1.1 only, for servers that mishandle HTTP/2 upgrades.
    Http1Only,
}

impl Strategy {
    const ORDER: [Strategy; 3] = [Strategy::HardenedTls, Strategy::Standard, Strategy::Http1Only];

    fn name(&self) -> &'static str {
        match self {
            Strategy::HardenedTls => "hardened-tls",
            Strategy::Standard => "standard",
            Strategy::Http1Only => "http1-only",
        }
    }

    fn client(&self, config: &DownloadConfig) -> reqwest::Result<Client> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        match self {
            Strategy::HardenedTls => Client::builder()
                .use_rustls_tls()
                .min_tls_version(reqwest::tls::Version::TLS_1_2)
                .redirect(Policy::none())
                .timeout(timeout)
                .build(),
            Strategy::Standard => Client::builder()
                .redirect(Policy::limited(config.max_redirects))
                .timeout(timeout)
                .build(),
            Strategy::Http1Only => Client::builder()
                .http1_only()
                .redirect(Policy::limited(config.max_redirects))
                .timeout(timeout)
                .build(),
        }
    }
}

/// Fetches raw bytes for a file reference.
pub struct DownloadManager {
    config: DownloadConfig,
}

impl DownloadManager {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// Fetch `url`, trying each strategy in order until one returns a
    /// non-empty payload.
    ///
    /// A zero-byte body is a failure even when the transport reports HTTP
    /// success. A malformed URL fails immediately without trying any
    /// strategy.
    pub async fn fetch(&self, url: &str, file_name: &str) -> Result<Vec<u8>, DownloadError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut reasons = Vec::with_capacity(Strategy::ORDER.len());
        let mut last = String::new();

        for (i, strategy) in Strategy::ORDER.iter().enumerate() {
            if i > 0 {
                // Give a possibly-unhealthy endpoint a moment before the
                // next strategy hits it.
                tokio::time::sleep(Duration::from_millis(self.config.strategy_delay_ms)).await;
            }

            match self.try_strategy(*strategy, parsed.clone()).await {
                Ok(bytes) => {
                    debug!(
                        "Downloaded {} ({} bytes) via {}",
                        file_name,
                        bytes.len(),
                        strategy.name()
                    );
                    return Ok(bytes);
                }
                Err(reason) => {
                    warn!(
                        "Strategy {} failed for {}: {}",
                        strategy.name(),
                        file_name,
                        reason
                    );
                    last = reason.clone();
                    reasons.push(format!("{}: {}", strategy.name(), reason));
                }
            }
        }

        Err(DownloadError::Exhausted {
            file_name: file_name.to_string(),
            last,
            reasons,
        })
    }

    async fn try_strategy(&self, strategy: Strategy, url: reqwest::Url) -> Result<Vec<u8>, String> {
        let client = strategy
            .client(&self.config)
            .map_err(|e| format!("client build failed: {}", e))?;

        let response = client.get(url).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("http status {}", status));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        if bytes.is_empty() {
            return Err("empty payload".to_string());
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn manager() -> DownloadManager {
        DownloadManager::new(DownloadConfig {
            timeout_seconds: 5,
            strategy_delay_ms: 0,
            max_redirects: 5,
        })
    }

    #[tokio::test]
    async fn test_fetch_happy_path_first_strategy() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/doc.txt");
            then.status(200).body("file contents");
        });

        let bytes = manager()
            .fetch(&server.url("/doc.txt"), "doc.txt")
            .await
            .unwrap();

        assert_eq!(bytes, b"file contents");
        // Only the first strategy was needed.
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_second_strategy_succeeds_after_redirect() {
        let server = MockServer::start();
        let redirect = server.mock(|when, then| {
            when.method(GET).path("/file");
            then.status(302).header("Location", &server.url("/real"));
        });
        let real = server.mock(|when, then| {
            when.method(GET).path("/real");
            then.status(200).body("redirected payload");
        });

        // The hardened client refuses redirects; the standard client follows.
        let bytes = manager()
            .fetch(&server.url("/file"), "file")
            .await
            .unwrap();

        assert_eq!(bytes, b"redirected payload");
        redirect.assert_hits(2);
        real.assert_hits(1);
    }

    #[tokio::test]
    async fn test_empty_payload_is_a_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/empty");
            then.status(200).body("");
        });

        let err = manager()
            .fetch(&server.url("/empty"), "empty.bin")
            .await
            .unwrap_err();

        mock.assert_hits(3);
        match err {
            DownloadError::Exhausted { reasons, last, .. } => {
                assert_eq!(reasons.len(), 3);
                assert_eq!(last, "empty payload");
                assert!(reasons[0].starts_with("hardened-tls:"));
                assert!(reasons[2].starts_with("http1-only:"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_reported_per_strategy() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let err = manager()
            .fetch(&server.url("/gone"), "gone.pdf")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("gone.pdf"));
    }

    #[tokio::test]
    async fn test_malformed_url_fails_without_any_attempt() {
        let err = manager()
            .fetch("not a url at all", "broken")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidUrl { .. }));

        let err = manager()
            .fetch("ftp://files.example/doc.txt", "doc.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    }
}

//! HTTP session for Fragment requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::{FragmentError, Result};
use crate::fragment::query::RequestSpec;
use async_trait::async_trait;
use rand::RngExt;
use retry_policies::policies::ExponentialBackoff;
use retry_policies::{Jitter, RetryDecision, RetryPolicy};
use std::time::{Duration, SystemTime};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Source of raw page HTML - enables fakes for tests.
#[async_trait]
pub trait GiftSource: Send + Sync {
    /// Fetches one page and returns its body.
    async fn fetch(&self, request: &RequestSpec) -> Result<String>;

    /// Root URL that relative links resolve against.
    fn base_url(&self) -> &str;
}

/// Shared connection pool with retry, politeness delay and a concurrency cap.
pub struct HttpSession {
    client: Client,
    base_url: String,
    permits: Semaphore,
    max_retries: u32,
    retry_policy: ExponentialBackoff,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl HttpSession {
    /// Builds the underlying client. Nothing is sent until the first fetch.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy =
                wreq::Proxy::all(proxy_url).map_err(|e| FragmentError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| FragmentError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            permits: Semaphore::new(config.max_concurrency.max(1)),
            max_retries: config.max_retries,
            retry_policy: retry_policy(config),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Free request slots right now.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Sends one GET and classifies the outcome.
    async fn get_once(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    FragmentError::Transport { url: url.to_string(), message: e.to_string() }
                } else {
                    FragmentError::Fetch { url: url.to_string(), status: None, message: e.to_string() }
                }
            })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status.as_u16() == 404 {
            return Err(FragmentError::NotFound { url: url.to_string() });
        }

        if !status.is_success() {
            return Err(FragmentError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("unexpected status").to_string(),
            });
        }

        response.text().await.map_err(|e| FragmentError::Transport {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })
    }

    /// Adds a random delay before each request.
    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }

    /// Jittered wait before the next attempt, or None once retries are spent.
    fn backoff(&self, started: SystemTime, past_retries: u32) -> Option<Duration> {
        match self.retry_policy.should_retry(started, past_retries) {
            RetryDecision::Retry { execute_after } => {
                Some(execute_after.duration_since(SystemTime::now()).unwrap_or_default())
            }
            RetryDecision::DoNotRetry => None,
        }
    }
}

/// Exponential backoff starting at `retry_backoff_ms`, doubling per retry.
fn retry_policy(config: &Config) -> ExponentialBackoff {
    let min = Duration::from_millis(config.retry_backoff_ms.max(1));
    let max = min.saturating_mul(1 << config.max_retries.min(10));

    ExponentialBackoff::builder()
        .retry_bounds(min, max)
        .jitter(Jitter::Bounded)
        .build_with_max_retries(config.max_retries)
}

#[async_trait]
impl GiftSource for HttpSession {
    async fn fetch(&self, request: &RequestSpec) -> Result<String> {
        let url = request.url(&self.base_url);

        // Held across retries; released on drop if the caller cancels
        let _permit = self.permits.acquire().await.map_err(|_| FragmentError::SessionClosed)?;

        let started = SystemTime::now();
        let mut retry = 0;
        loop {
            self.delay().await;

            let err = match self.get_once(&url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            let Some(wait) = self.backoff(started, retry) else {
                return Err(err);
            };
            retry += 1;
            warn!("{} (retry {}/{} in {:?})", err, retry, self.max_retries, wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

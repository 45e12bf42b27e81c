//! Blocking HTTP client with a randomized politeness delay between requests.

use crate::scraper::{PageSource, ScrapeError};
use rand::Rng;
use std::time::{Duration, Instant};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; chapscrape/0.1; +https://github.com/chapscrape)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Base pause before each request after the first.
const DEFAULT_DELAY_BASE_MS: u64 = 1100;
/// Upper bound of the uniform jitter added on top of the base pause.
const DEFAULT_DELAY_JITTER_MS: u64 = 1400;
const MAX_REDIRECTS: usize = 10;

/// Blocking HTTP client that enforces a randomized delay between requests.
///
/// The delay is sampled per request as base plus uniform jitter, so request
/// spacing never falls into a fixed rhythm. Throttling policy only; there
/// are no retries, and transport failures propagate unmodified.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay_base: Duration,
    delay_jitter: Duration,
    last_request: Option<Instant>,
}

impl PoliteClient {
    /// Build a polite client with default User-Agent, timeout, and delay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    /// Builder for custom User-Agent, delay bounds, and timeout.
    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// Perform a GET request. Sleeps until the sampled delay has passed
    /// since the last request; the first request is not delayed.
    pub fn get(&mut self, url: &str) -> Result<reqwest::blocking::Response, reqwest::Error> {
        self.wait_delay();
        let response = self.inner.get(url).send()?;
        self.last_request = Some(Instant::now());
        Ok(response)
    }

    fn wait_delay(&mut self) {
        if let Some(last) = self.last_request {
            let target = self.sample_delay();
            let elapsed = last.elapsed();
            if elapsed < target {
                std::thread::sleep(target - elapsed);
            }
        }
    }

    fn sample_delay(&self) -> Duration {
        if self.delay_jitter.is_zero() {
            return self.delay_base;
        }
        self.delay_base + self.delay_jitter.mul_f64(rand::rng().random::<f64>())
    }
}

impl PageSource for PoliteClient {
    fn page_source(&mut self, url: &str) -> Result<String, ScrapeError> {
        let response = self.get(url).map_err(|e| ScrapeError::Network {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().map_err(|e| ScrapeError::BodyRead {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Builder for [PoliteClient] with optional User-Agent, delay bounds, and timeout.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    delay_base_ms: u64,
    delay_jitter_ms: u64,
    timeout_secs: u64,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_base_ms: DEFAULT_DELAY_BASE_MS,
            delay_jitter_ms: DEFAULT_DELAY_JITTER_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PoliteClientBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the base delay between requests in milliseconds. Default 1100.
    pub fn delay_base_ms(mut self, ms: u64) -> Self {
        self.delay_base_ms = ms;
        self
    }

    /// Set the upper bound of the uniform jitter in milliseconds. Default 1400.
    pub fn delay_jitter_ms(mut self, ms: u64) -> Self {
        self.delay_jitter_ms = ms;
        self
    }

    /// Set the request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Build the blocking client and polite wrapper.
    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(PoliteClient {
            inner,
            delay_base: Duration::from_millis(self.delay_base_ms),
            delay_jitter: Duration::from_millis(self.delay_jitter_ms),
            last_request: None,
        })
    }
}

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REFERER_URL: &str = "https://www.espn.com/";

/// Statuses worth another attempt. Every other non-200 status is final.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Endpoint class, used to pick the politeness delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Scoreboard,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Linear backoff: the wait after attempt `n` is `base_delay * n`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Politeness {
    pub scoreboard: Duration,
    pub summary: Duration,
}

impl Politeness {
    pub fn none() -> Self {
        Self {
            scoreboard: Duration::ZERO,
            summary: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, endpoint: Endpoint) -> Duration {
        match endpoint {
            Endpoint::Scoreboard => self.scoreboard,
            Endpoint::Summary => self.summary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str::<Value>(self.body.trim())
            .with_context(|| format!("invalid json from {}", self.url))
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("gave up after {attempts} attempts, last status {status}")]
    RetryableStatus { attempts: u32, status: u16 },
    #[error("gave up after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },
}

/// Result of a resilient fetch. Callers decide whether to degrade; nothing
/// here is an `Err`.
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200.
    Success(HttpResponse),
    /// Non-retryable status, returned after a single attempt.
    Rejected(HttpResponse),
    /// Retryable failures on every attempt.
    Exhausted(FetchFailure),
}

impl FetchOutcome {
    pub fn success(self) -> Option<HttpResponse> {
        match self {
            FetchOutcome::Success(resp) => Some(resp),
            _ => None,
        }
    }
}

/// One GET on the wire. The crawler only ever needs a query string.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(transport_error)?;
        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let body = resp.text().map_err(transport_error)?;
        Ok(HttpResponse { status, url, body })
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// GET with retry, linear backoff and a politeness pause after every fetch.
pub struct ResilientClient<T = ReqwestTransport> {
    transport: T,
    retry: RetryPolicy,
    politeness: Politeness,
}

impl<T: Transport> ResilientClient<T> {
    pub fn new(transport: T, retry: RetryPolicy, politeness: Politeness) -> Self {
        Self {
            transport,
            retry,
            politeness,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fetch(&self, endpoint: Endpoint, url: &str, query: &[(&str, String)]) -> FetchOutcome {
        let outcome = self.fetch_with_retries(url, query);
        pause(self.politeness.delay_for(endpoint));
        outcome
    }

    fn fetch_with_retries(&self, url: &str, query: &[(&str, String)]) -> FetchOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let failure = match self.transport.get(url, query) {
                Ok(resp) if resp.status == 200 => {
                    debug!(url = %resp.url, attempt, "fetch ok");
                    return FetchOutcome::Success(resp);
                }
                Ok(resp) if is_retryable_status(resp.status) => {
                    debug!(url = %resp.url, status = resp.status, attempt, "retryable status");
                    FetchFailure::RetryableStatus {
                        attempts: attempt,
                        status: resp.status,
                    }
                }
                Ok(resp) => {
                    warn!(url = %resp.url, status = resp.status, "non-retryable status");
                    return FetchOutcome::Rejected(resp);
                }
                Err(err) => {
                    debug!(url, attempt, error = %err, "transport error");
                    FetchFailure::Transport {
                        attempts: attempt,
                        source: err,
                    }
                }
            };

            if attempt >= max_attempts {
                warn!(url, error = %failure, "retries exhausted");
                return FetchOutcome::Exhausted(failure);
            }
            let wait = self.retry.backoff(attempt);
            debug!(url, attempt, wait_ms = wait.as_millis() as u64, "backing off");
            pause(wait);
            attempt += 1;
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

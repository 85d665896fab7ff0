//! Single-page HTTP fetching with rate-limit aware retry.
//!
//! # Architecture
//!
//! - [`PageFetch`]: core trait, "GET this URL and give me status + body"
//! - [`HttpFetcher`]: `reqwest` implementation with a browser-like `User-Agent`
//! - [`RetryFetch`]: decorator adding randomized pacing and 429 backoff to any
//!   [`PageFetch`]
//! - [`Sleeper`]: where the waiting actually happens, so tests can observe it
//!
//! # Retry Strategy
//!
//! - Random pause of 2-6s before every attempt, the first included
//! - HTTP 429 is a retryable outcome; transport errors are returned at once
//! - Up to 5 attempts in total
//! - Backoff after a 429 on attempt `n`: `clamp(multiplier * 2^(n-1), 4s, 60s)`

use crate::error::ScrapeError;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};
use url::Url;

/// HTTP status signalling "slow down and try again".
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_rate_limited(&self) -> bool {
        self.status == TOO_MANY_REQUESTS
    }
}

/// Anything that can GET a page.
pub trait PageFetch {
    /// Fetch `url` once.
    ///
    /// A non-success status is still `Ok`; only transport failures are `Err`.
    async fn get(&self, url: &Url) -> Result<RawResponse, ScrapeError>;
}

/// Blocks the current task for a while.
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `reqwest` based [`PageFetch`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client that sends `user_agent` on every request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &Url) -> Result<RawResponse, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Fetched page");
        Ok(RawResponse { status, body })
    }
}

/// Timing and attempt limits for [`RetryFetch`].
///
/// Durations are configured in seconds so the policy can live in the YAML
/// config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per page, the first included.
    pub max_attempts: usize,
    /// Lower bound of the random pause before each attempt.
    pub min_jitter_secs: f64,
    /// Upper bound of the random pause before each attempt.
    pub max_jitter_secs: f64,
    /// Scale applied to `2^(n-1)` when backing off after attempt `n`.
    pub multiplier: f64,
    /// Floor for the backoff delay.
    pub min_backoff_secs: f64,
    /// Ceiling for the backoff delay.
    pub max_backoff_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_jitter_secs: 2.0,
            max_jitter_secs: 6.0,
            multiplier: 1.0,
            min_backoff_secs: 4.0,
            max_backoff_secs: 60.0,
        }
    }
}

impl RetryPolicy {
    /// Reject timings that cannot become a [`Duration`] or whose bounds are
    /// inverted.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        let fields = [
            ("min_jitter_secs", self.min_jitter_secs),
            ("max_jitter_secs", self.max_jitter_secs),
            ("multiplier", self.multiplier),
            ("min_backoff_secs", self.min_backoff_secs),
            ("max_backoff_secs", self.max_backoff_secs),
        ];
        for (name, value) in fields {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ScrapeError::InvalidRetryPolicy(format!(
                    "{name} must be a finite, non-negative number of seconds, got {value}"
                )));
            }
        }
        if self.min_jitter_secs > self.max_jitter_secs {
            return Err(ScrapeError::InvalidRetryPolicy(
                "min_jitter_secs is greater than max_jitter_secs".to_string(),
            ));
        }
        if self.min_backoff_secs > self.max_backoff_secs {
            return Err(ScrapeError::InvalidRetryPolicy(
                "min_backoff_secs is greater than max_backoff_secs".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay to wait after attempt `attempt` (1-based) was rate limited.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.multiplier * 2f64.powi(exp);
        let secs = raw.max(self.min_backoff_secs).min(self.max_backoff_secs);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    /// Random pause taken before every attempt.
    pub fn jitter(&self) -> Duration {
        let (lo, hi) = (self.min_jitter_secs.max(0.0), self.max_jitter_secs.max(0.0));
        if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            return Duration::try_from_secs_f64(lo).unwrap_or(Duration::ZERO);
        }
        Duration::try_from_secs_f64(rng().random_range(lo..=hi)).unwrap_or(Duration::ZERO)
    }
}

/// Decorator that paces requests and retries rate-limited ones.
pub struct RetryFetch<T, S = TokioSleeper> {
    inner: T,
    policy: RetryPolicy,
    sleeper: S,
}

impl<T> RetryFetch<T, TokioSleeper>
where
    T: PageFetch,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self::with_sleeper(inner, policy, TokioSleeper)
    }
}

impl<T, S> RetryFetch<T, S>
where
    T: PageFetch,
    S: Sleeper,
{
    pub fn with_sleeper(inner: T, policy: RetryPolicy, sleeper: S) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }
}

impl<T, S> fmt::Debug for RetryFetch<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T, S> PageFetch for RetryFetch<T, S>
where
    T: PageFetch,
    S: Sleeper,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn get(&self, url: &Url) -> Result<RawResponse, ScrapeError> {
        let total_t0 = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let pause = self.policy.jitter();
            if !pause.is_zero() {
                self.sleeper.sleep(pause).await;
            }

            let response = self.inner.get(url).await?;
            if !response.is_rate_limited() {
                if !(200..300).contains(&response.status) {
                    warn!(status = response.status, attempt, "Unexpected status; using body as-is");
                }
                return Ok(response);
            }

            if attempt >= max_attempts {
                error!(
                    attempt,
                    max = max_attempts,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    "Still rate limited; giving up on page"
                );
                return Err(ScrapeError::RateLimited { attempts: attempt });
            }

            let delay = self.policy.backoff(attempt);
            warn!(
                attempt,
                max = max_attempts,
                ?delay,
                "Rate limited (429); backing off"
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

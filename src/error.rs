//! Error types for the Google News scraper.
//!
//! Only [`ScrapeError::MalformedDateInput`] ever reaches the caller of
//! [`NewsScraper::fetch`](crate::scrapers::google_news::NewsScraper::fetch).
//! [`ScrapeError::InvalidRetryPolicy`] is raised while loading the config.
//! The other variants describe page-level failures that end pagination early,
//! and [`ExtractError`] describes a single result block that was skipped.

use thiserror::Error;

/// Errors raised while scraping search-result pages.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A caller-supplied date matched neither `YYYY-MM-DD` nor `MM/DD/YYYY`.
    #[error("malformed date input {input:?}: expected YYYY-MM-DD or MM/DD/YYYY")]
    MalformedDateInput { input: String },

    /// Still receiving HTTP 429 after every allowed attempt.
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: usize },

    /// Transport-level failure from the HTTP client.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any other failure to retrieve a page.
    #[error("page fetch failed: {0}")]
    PageFetch(String),

    /// The configured search endpoint is not a valid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A retry timing from the config file cannot be turned into a delay.
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),
}

/// Why a single result block was dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing {0} node")]
    MissingNode(&'static str),

    #[error("missing {0} attribute")]
    MissingAttribute(&'static str),

    #[error("empty {0}")]
    EmptyField(&'static str),

    #[error("unparseable date {0:?}")]
    UnparseableDate(String),
}

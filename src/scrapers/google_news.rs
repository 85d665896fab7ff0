//! Google News search scraper.
//!
//! [`NewsScraper::fetch`] walks the paginated news vertical of a search
//! endpoint for one query and date range:
//!
//! 1. Normalize the range (the only step that can fail the call)
//! 2. Fetch page `n` at offset `n * 10` through a [`PageFetch`]
//! 3. Extract candidates with a [`ResultExtractor`]; an empty page ends the walk
//! 4. Keep candidates inside the range, in discovery order
//! 5. Continue while the page links to a next page
//!
//! A page that cannot be fetched (still rate limited after every retry, or a
//! transport failure) ends the walk; whatever was gathered so far is returned.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::NewsItem;
use crate::scrapers::dates::DateRange;
use crate::scrapers::extract::{GoogleNewsExtractor, ResultExtractor};
use crate::scrapers::fetch::{HttpFetcher, PageFetch, RetryFetch};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Results per page on the search endpoint.
pub const PAGE_SIZE: usize = 10;

/// Paginating scraper over any fetcher/extractor pair.
#[derive(Debug)]
pub struct NewsScraper<F, E> {
    fetcher: F,
    extractor: E,
    base_url: Url,
    max_pages: Option<usize>,
}

impl NewsScraper<RetryFetch<HttpFetcher>, GoogleNewsExtractor> {
    /// Production scraper: `reqwest` + retry policy + Google News selectors.
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.base_url)?;
        let http = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.request_timeout_secs))?;
        let fetcher = RetryFetch::new(http, config.retry.clone());
        let extractor = GoogleNewsExtractor::new(base_url.clone());
        Ok(Self::new(fetcher, extractor, base_url).with_max_pages(config.max_pages))
    }
}

impl<F, E> NewsScraper<F, E>
where
    F: PageFetch,
    E: ResultExtractor,
{
    pub fn new(fetcher: F, extractor: E, base_url: Url) -> Self {
        Self {
            fetcher,
            extractor,
            base_url,
            max_pages: None,
        }
    }

    /// Stop after `max_pages` pages even if more are linked.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// URL of results page `page` for `query` within `range`.
    pub fn page_url(&self, query: &str, range: &DateRange, page: usize) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair(
                "tbs",
                &format!("cdr:1,cd_min:{},cd_max:{}", range.query_start(), range.query_end()),
            )
            .append_pair("tbm", "nws")
            .append_pair("start", &(page * PAGE_SIZE).to_string());
        url
    }

    /// Scrape every results page for `query` between `start_date` and
    /// `end_date` (inclusive, `YYYY-MM-DD` or `MM/DD/YYYY`).
    ///
    /// # Errors
    ///
    /// Only [`ScrapeError::MalformedDateInput`], raised before any request is
    /// made. Page-level failures end pagination and the items gathered up to
    /// that point are returned.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(
        &self,
        query: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<NewsItem>, ScrapeError> {
        let range = DateRange::parse(start_date, end_date)?;
        if range.is_empty() {
            warn!(%range.start, %range.end, "Start date is after end date; nothing to fetch");
            return Ok(Vec::new());
        }

        let t0 = Instant::now();
        let mut items = Vec::new();
        let mut page = 0usize;

        loop {
            if self.max_pages.is_some_and(|max| page >= max) {
                info!(page, "Reached page limit");
                break;
            }

            let url = self.page_url(query, &range, page);
            let response = match self.fetcher.get(&url).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        page,
                        error = %e,
                        collected = items.len(),
                        "Page fetch failed; returning results gathered so far"
                    );
                    break;
                }
            };

            let parsed = self.extractor.parse(&response.body);
            if parsed.candidates.is_empty() {
                debug!(page, "No results on page");
                break;
            }

            let found = parsed.candidates.len();
            let before = items.len();
            items.extend(parsed.candidates.into_iter().filter(|item| range.contains(item.date)));
            info!(
                page,
                found,
                kept = items.len() - before,
                total = items.len(),
                "Scraped results page"
            );

            if !parsed.has_next_page {
                break;
            }
            page += 1;
        }

        info!(
            count = items.len(),
            last_page = page,
            elapsed_ms = t0.elapsed().as_millis(),
            "Finished news scrape"
        );
        Ok(items)
    }
}

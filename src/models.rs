//! Data models for scraped news items and the feed written to disk.
//!
//! - [`NewsItem`]: one search result that passed extraction and date filtering
//! - [`NewsFeed`]: the envelope serialized to the JSON output file

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single news article reference scraped from a search-results page.
///
/// `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsItem {
    /// Absolute URL of the article.
    pub link: String,
    /// Headline as shown on the results page.
    pub title: String,
    /// Short summary shown under the headline.
    pub snippet: String,
    /// Publication date, normalized from the page's free-text date.
    pub date: NaiveDate,
    /// Publication name.
    pub source: String,
}

/// The result of one scrape, as written to the JSON output.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewsFeed {
    /// The search query.
    pub query: String,
    /// Inclusive lower bound of the requested range.
    pub start_date: NaiveDate,
    /// Inclusive upper bound of the requested range.
    pub end_date: NaiveDate,
    /// Local time the scrape finished, RFC 3339.
    pub fetched_at: String,
    /// Items in discovery order.
    pub items: Vec<NewsItem>,
}

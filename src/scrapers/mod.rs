//! Google News scraping.
//!
//! The scraper is split along its failure boundaries:
//!
//! | Module | Role | Failure handling |
//! |--------|------|------------------|
//! | [`fetch`] | One page GET with pacing and 429 backoff | Errors after 5 rate-limited attempts |
//! | [`extract`] | Markup to candidate items | Skips broken blocks, never fails |
//! | [`dates`] | Caller range and on-page date parsing | Malformed caller input is fatal |
//! | [`google_news`] | Pagination and date filtering | Returns partial results on page failure |
//!
//! Pagination is strictly sequential: one page is fetched, extracted and
//! filtered before the next request is made.

pub mod dates;
pub mod extract;
pub mod fetch;
pub mod google_news;

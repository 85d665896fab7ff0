//! Output generation for scraped feeds and analyst reports.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`NewsFeed`](crate::models::NewsFeed) for API consumption
//! - [`markdown`]: Renders the feed and the cleaned report for reading
//!
//! # Output Structure
//!
//! Both files share a stem built from the query and the requested range:
//!
//! ```text
//! json_output_dir/
//! └── apple-inc_2024-01-01_2024-01-31.json
//!
//! markdown_output_dir/
//! └── apple-inc_2024-01-01_2024-01-31.md
//! ```

use crate::models::NewsFeed;
use crate::utils::slugify_title;

pub mod json;
pub mod markdown;

/// Shared file stem for every output of one scrape.
pub fn file_stem(feed: &NewsFeed) -> String {
    format!(
        "{}_{}_{}",
        slugify_title(&feed.query),
        feed.start_date,
        feed.end_date
    )
}

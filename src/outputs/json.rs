//! JSON output generation for the API.
//!
//! Serializes the scraped [`NewsFeed`] so downstream consumers (the analyst
//! step, dashboards, backtests) can reuse a scrape without hitting the
//! search endpoint again.

use crate::models::NewsFeed;
use crate::outputs::file_stem;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`NewsFeed`] as pretty JSON into `json_output_dir`.
///
/// # Returns
///
/// The path written, `{json_output_dir}/{query-slug}_{start}_{end}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_feed(feed: &NewsFeed, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(feed)?;

    info!(%json_output_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(%json_output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = PathBuf::from(json_output_dir).join(format!("{}.json", file_stem(feed)));
    fs::write(&path, json).await?;
    info!(path = %path.display(), items = feed.items.len(), "Wrote JSON feed");

    Ok(path)
}

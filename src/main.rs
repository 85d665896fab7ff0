//! # News Analyst
//!
//! Scrapes date-bounded Google News results for a query and, optionally,
//! turns them into a cleaned news-analyst report through an OpenAI-compatible
//! LLM.
//!
//! ## Usage
//!
//! ```sh
//! news_analyst -q "Apple Inc" -s 2024-01-01 -e 2024-01-31 -j ./json -m ./markdown \
//!     --ticker AAPL --trade-date 2024-01-31
//! ```
//!
//! ## Architecture
//!
//! 1. **Scraping**: Walk the paginated news results, pacing and retrying
//!    rate-limited requests, keeping items inside the date range
//! 2. **Output**: Write the feed as JSON
//! 3. **Analysis** (with `--ticker`): Ask the model for a report and clean it
//! 4. **Report**: Write Markdown with the report and the articles

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod analyst;
mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use analyst::AnalysisContext;
use cli::Cli;
use models::NewsFeed;
use outputs::{file_stem, json, markdown};
use scrapers::dates::DateRange;
use scrapers::google_news::NewsScraper;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_analyst starting up");

    let args = Cli::parse();
    debug!(query = %args.query, start = %args.start_date, end = %args.end_date, "Parsed CLI arguments");

    let mut config = config::load_config(args.config.as_deref())?;
    if args.llm_api_key.is_some() {
        config.llm.api_key = args.llm_api_key.clone();
    }

    // Reject a bad range before touching the file system or the network.
    let range = DateRange::parse(&args.start_date, &args.end_date)?;

    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir,
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Scrape ----
    let scraper = NewsScraper::from_config(&config.scraper)?;
    let items = scraper
        .fetch(&args.query, &args.start_date, &args.end_date)
        .await?;
    info!(count = items.len(), "Scraped news items");

    let feed = NewsFeed {
        query: args.query.clone(),
        start_date: range.start,
        end_date: range.end,
        fetched_at: Local::now().to_rfc3339(),
        items,
    };
    json::write_feed(&feed, &args.json_output_dir).await?;

    // ---- Analyst report ----
    let report = match (&args.ticker, &args.trade_date) {
        (Some(ticker), Some(trade_date)) => {
            let ctx = AnalysisContext {
                ticker: ticker.clone(),
                trade_date: trade_date.clone(),
            };
            let asker = api::client_with_backoff(&config.llm)?;
            match analyst::analyze(&asker, &feed.items, &ctx).await {
                Ok(report) => {
                    debug!(preview = %truncate_for_log(&report, 300), "Analyst report");
                    Some(report)
                }
                Err(e) => {
                    error!(error = %e, "Analyst report failed; writing articles only");
                    None
                }
            }
        }
        _ => None,
    };

    // ---- Markdown output ----
    match &args.markdown_output_dir {
        Some(dir) => {
            let md = markdown::feed_to_markdown(&feed, report.as_deref());
            let path = format!("{}/{}.md", dir.trim_end_matches('/'), file_stem(&feed));
            if let Err(e) = ensure_writable_dir(dir).await {
                error!(path = %dir, error = %e, "Markdown output directory is not writable");
            } else if let Err(e) = tokio::fs::write(&path, md).await {
                error!(%path, error = %e, "Failed writing Markdown");
            } else {
                info!(%path, "Wrote Markdown report");
            }
        }
        None if report.is_some() => {
            warn!("Analyst report produced but no --markdown-output-dir given; printing to stdout");
            println!("{}", report.as_deref().unwrap_or_default());
        }
        None => {}
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        items = feed.items.len(),
        "Execution complete"
    );

    Ok(())
}

//! Command-line interface definitions for the news analyst.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via environment variables instead of flags.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one scrape (and optional analyst report).
///
/// # Examples
///
/// ```sh
/// # Scrape January news for a query
/// news_analyst -q "Apple Inc" -s 2024-01-01 -e 2024-01-31 -j ./json
///
/// # Also write Markdown and ask the model for an analyst report
/// news_analyst -q "Apple Inc" -s 01/01/2024 -e 01/31/2024 -j ./json -m ./markdown \
///     --ticker AAPL --trade-date 2024-01-31
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Free-text search query
    #[arg(short, long)]
    pub query: String,

    /// First day of the range, YYYY-MM-DD or MM/DD/YYYY
    #[arg(short, long)]
    pub start_date: String,

    /// Last day of the range (inclusive), YYYY-MM-DD or MM/DD/YYYY
    #[arg(short, long)]
    pub end_date: String,

    /// Output directory for the JSON feed
    #[arg(short, long)]
    pub json_output_dir: String,

    /// Output directory for the Markdown report
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ticker to write the analyst report for; enables the LLM step
    #[arg(long, requires = "trade_date")]
    pub ticker: Option<String>,

    /// Trading date the report is written for
    #[arg(long, requires = "ticker")]
    pub trade_date: Option<String>,

    /// API key for the chat completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "news_analyst",
            "--query",
            "Apple Inc",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-01-31",
            "--json-output-dir",
            "./json",
        ])
        .unwrap();

        assert_eq!(cli.query, "Apple Inc");
        assert_eq!(cli.start_date, "2024-01-01");
        assert_eq!(cli.end_date, "2024-01-31");
        assert_eq!(cli.json_output_dir, "./json");
        assert!(cli.markdown_output_dir.is_none());
        assert!(cli.ticker.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from([
            "news_analyst",
            "-q",
            "Tesla",
            "-s",
            "01/01/2024",
            "-e",
            "01/31/2024",
            "-j",
            "/tmp/json",
            "-m",
            "/tmp/markdown",
            "-c",
            "config.yaml",
        ])
        .unwrap();

        assert_eq!(cli.query, "Tesla");
        assert_eq!(cli.markdown_output_dir.as_deref(), Some("/tmp/markdown"));
        assert_eq!(cli.config, Some(PathBuf::from("config.yaml")));
    }

    #[test]
    fn test_ticker_requires_trade_date() {
        let result = Cli::try_parse_from([
            "news_analyst",
            "-q",
            "Apple Inc",
            "-s",
            "2024-01-01",
            "-e",
            "2024-01-31",
            "-j",
            "./json",
            "--ticker",
            "AAPL",
        ]);
        assert!(result.is_err());
    }
}

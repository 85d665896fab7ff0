//! News analyst: turns scraped items into a cleaned trading-oriented report.
//!
//! The model is asked once per report. Its reply tends to open with a
//! planning paragraph ("I'll start by looking at...") and to repeat lines, so
//! [`clean_report`] strips those before the text is handed on.

use crate::api::{AskAsync, ChatMessage};
use crate::models::NewsItem;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::Write;
use tracing::{info, instrument};

const ROLE_PREAMBLE: &str = "You are a helpful AI assistant, collaborating with other assistants. \
Use the provided news to progress towards answering the question. If you are unable to fully \
answer, that's OK; another assistant will help where you left off. Execute what you can to make \
progress.";

const ANALYST_INSTRUCTIONS: &str = "You are a news researcher tasked with analyzing recent news \
and trends over the past week. Please write a comprehensive report of the current state of the \
world that is relevant for trading and macroeconomics. Do not simply state the trends are mixed, \
provide detailed and finegrained analysis and insights that may help traders make decisions. \
Make sure to append a Markdown table at the end of the report to organize key points in the \
report, organized and easy to read.";

static INTRO_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("intro break pattern"));
static PLANNING_ASIDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*(?:I will|I'll)[^)]*\)\s*").expect("planning aside pattern"));
static PLANNING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:I will|I'll)[^\n]*\n+").expect("planning line pattern"));

/// What the report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisContext {
    pub ticker: String,
    /// Trading date the report is written for, `YYYY-MM-DD`.
    pub trade_date: String,
}

/// Render items as a compact digest for the prompt.
pub fn news_digest(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "No news items were found for the requested period.".to_string();
    }
    let mut digest = String::new();
    for (i, item) in items.iter().enumerate() {
        writeln!(
            digest,
            "{}. [{}] {} ({})\n   {}\n   {}",
            i + 1,
            item.date,
            item.title,
            item.source,
            item.snippet,
            item.link
        )
        .unwrap();
    }
    digest
}

/// System + user messages for one analyst request.
pub fn build_messages(items: &[NewsItem], ctx: &AnalysisContext) -> Vec<ChatMessage> {
    let system = format!(
        "{ROLE_PREAMBLE}\n{ANALYST_INSTRUCTIONS}\nFor your reference, the current date is {}. \
We are looking at the company {}.",
        ctx.trade_date, ctx.ticker
    );
    let user = format!(
        "Recent news for {} up to {}:\n\n{}",
        ctx.ticker,
        ctx.trade_date,
        news_digest(items)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Strip the model's planning chatter and repeated lines.
///
/// 1. Drop everything up to the first blank line, if there is one
/// 2. Remove parenthetical asides containing "I will" / "I'll"
/// 3. Remove a leading line starting with "I will" / "I'll"
/// 4. Collapse consecutive duplicate lines
/// 5. Trim
pub fn clean_report(raw: &str) -> String {
    let body = match INTRO_BREAK.splitn(raw, 2).collect::<Vec<_>>().as_slice() {
        [_, rest] => (*rest).to_string(),
        _ => raw.to_string(),
    };
    let body = PLANNING_ASIDE.replace_all(&body, "");
    let body = PLANNING_LINE.replace_all(&body, "");
    body.lines().dedup().join("\n").trim().to_string()
}

/// Ask the model for a report on `items` and clean its reply.
#[instrument(level = "info", skip_all, fields(ticker = %ctx.ticker, trade_date = %ctx.trade_date, items = items.len()))]
pub async fn analyze<A: AskAsync>(
    asker: &A,
    items: &[NewsItem],
    ctx: &AnalysisContext,
) -> Result<String, Box<dyn Error>> {
    let messages = build_messages(items, ctx);
    let raw = asker.ask(&messages).await?;
    let report = clean_report(&raw);
    info!(raw_bytes = raw.len(), report_bytes = report.len(), "News report ready");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn ctx() -> AnalysisContext {
        AnalysisContext {
            ticker: "AAPL".to_string(),
            trade_date: "2024-01-31".to_string(),
        }
    }

    fn item() -> NewsItem {
        NewsItem {
            link: "https://example.com/a".to_string(),
            title: "Apple beats estimates".to_string(),
            snippet: "Revenue rose".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
            source: "Reuters".to_string(),
        }
    }

    #[test]
    fn test_clean_report_strips_intro_and_planning() {
        let raw = "Let me look at the news first.\n\nI will now write the report.\n\n## Summary\n\
Markets rallied (I will expand on this later) on earnings.\n\
| Key | Point |\n| Key | Point |\n| Key | Point |\nDone.\n";

        assert_eq!(
            clean_report(raw),
            "## Summary\nMarkets rallied on earnings.\n| Key | Point |\nDone."
        );
    }

    #[test]
    fn test_clean_report_without_blank_line_keeps_text() {
        assert_eq!(clean_report("  Single paragraph report.  "), "Single paragraph report.");
    }

    #[test]
    fn test_clean_report_planning_lines_case_insensitive() {
        let raw = "intro\n\ni'll skip this\nKeep this\nkeep this\n";
        assert_eq!(clean_report(raw), "Keep this\nkeep this");
    }

    #[test]
    fn test_clean_report_only_leading_planning_line_removed() {
        let raw = "intro\n\nBody\nI will revisit this next week.\n";
        assert_eq!(clean_report(raw), "Body\nI will revisit this next week.");
    }

    #[test]
    fn test_build_messages_carries_context() {
        let messages = build_messages(&[item()], &ctx());

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("the current date is 2024-01-31"));
        assert!(messages[0].content.contains("company AAPL"));
        assert!(messages[0].content.contains("Markdown table"));
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("1. [2024-01-30] Apple beats estimates (Reuters)"));
    }

    #[test]
    fn test_digest_without_items() {
        assert!(news_digest(&[]).contains("No news items"));
    }

    struct Canned {
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl AskAsync for Canned {
        async fn ask(&self, messages: &[ChatMessage]) -> Result<String, Box<dyn Error>> {
            self.seen.lock().unwrap().extend_from_slice(messages);
            Ok("Let me plan.\n\nApple looks strong.\nApple looks strong.".to_string())
        }
    }

    #[tokio::test]
    async fn test_analyze_cleans_reply() {
        let asker = Canned {
            seen: Mutex::new(Vec::new()),
        };

        let report = analyze(&asker, &[item()], &ctx()).await.unwrap();

        assert_eq!(report, "Apple looks strong.");
        assert_eq!(asker.seen.lock().unwrap().len(), 2);
    }
}

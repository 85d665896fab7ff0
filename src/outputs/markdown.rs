//! Markdown rendering of a scrape and its analyst report.

use crate::models::NewsFeed;
use std::fmt::Write;

/// Render `feed`, with the cleaned analyst `report` first when there is one.
pub fn feed_to_markdown(feed: &NewsFeed, report: Option<&str>) -> String {
    let mut md = String::new();

    writeln!(md, "# News: {}\n", feed.query).unwrap();
    writeln!(
        md,
        "_{} to {} · {} items · fetched {}_\n",
        feed.start_date,
        feed.end_date,
        feed.items.len(),
        feed.fetched_at
    )
    .unwrap();

    if let Some(report) = report {
        writeln!(md, "## Analyst Report\n").unwrap();
        writeln!(md, "{}\n", report.trim()).unwrap();
    }

    writeln!(md, "## Articles\n").unwrap();
    if feed.items.is_empty() {
        writeln!(md, "No articles found in this range.").unwrap();
        return md;
    }
    for item in &feed.items {
        writeln!(md, "### [{}]({})\n", item.title, item.link).unwrap();
        writeln!(md, "**{}** · {}\n", item.source, item.date).unwrap();
        if !item.snippet.is_empty() {
            writeln!(md, "> {}\n", item.snippet).unwrap();
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsItem;
    use chrono::NaiveDate;

    fn feed(items: Vec<NewsItem>) -> NewsFeed {
        NewsFeed {
            query: "Apple Inc".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            fetched_at: "2024-02-01T09:00:00+00:00".to_string(),
            items,
        }
    }

    #[test]
    fn test_markdown_with_report() {
        let md = feed_to_markdown(
            &feed(vec![NewsItem {
                link: "https://example.com/a".to_string(),
                title: "Apple beats".to_string(),
                snippet: "Revenue rose".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
                source: "Reuters".to_string(),
            }]),
            Some("Apple looks strong."),
        );

        assert!(md.starts_with("# News: Apple Inc\n"));
        assert!(md.contains("## Analyst Report\n\nApple looks strong.\n"));
        assert!(md.contains("### [Apple beats](https://example.com/a)"));
        assert!(md.contains("**Reuters** · 2024-01-30"));
        assert!(md.contains("> Revenue rose"));
        assert!(md.find("## Analyst Report").unwrap() < md.find("## Articles").unwrap());
    }

    #[test]
    fn test_markdown_without_items_or_report() {
        let md = feed_to_markdown(&feed(vec![]), None);
        assert!(!md.contains("Analyst Report"));
        assert!(md.contains("No articles found"));
    }
}

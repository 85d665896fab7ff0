//! Google News results-page extraction.
//!
//! Every site-specific CSS selector lives in this module. When Google changes
//! its markup, this file and its fixture page are the only things to update.
//!
//! | Field | Selector |
//! |-------|----------|
//! | result block | `div.SoaBEf` |
//! | link | first `a[href]` in the block |
//! | title | `div.MBeuO` |
//! | snippet | `.GI74Re` |
//! | date | `.LfVVr` |
//! | source | `.NUnG9d span` |
//! | next page | `a#pnnext` |

use crate::error::ExtractError;
use crate::models::NewsItem;
use crate::scrapers::dates::parse_flexible_date;
use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

static RESULT_BLOCK: Lazy<Selector> = Lazy::new(|| selector("div.SoaBEf"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("div.MBeuO"));
static SNIPPET: Lazy<Selector> = Lazy::new(|| selector(".GI74Re"));
static DATE: Lazy<Selector> = Lazy::new(|| selector(".LfVVr"));
static SOURCE: Lazy<Selector> = Lazy::new(|| selector(".NUnG9d span"));
static NEXT_PAGE: Lazy<Selector> = Lazy::new(|| selector("a#pnnext"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// Everything the pagination loop needs from one page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Items that extracted cleanly, in page order. Not yet date filtered.
    pub candidates: Vec<NewsItem>,
    /// Whether the page links to a further page of results.
    pub has_next_page: bool,
}

/// Turns one results page into candidate items.
///
/// Implementations never fail: a block that cannot be extracted is skipped.
pub trait ResultExtractor {
    fn parse(&self, page: &str) -> ParsedPage;
}

/// [`ResultExtractor`] for the Google News vertical (`tbm=nws`).
#[derive(Debug, Clone)]
pub struct GoogleNewsExtractor {
    /// Resolves relative result links.
    base_url: Url,
    /// Anchor for relative dates such as `3 hours ago`.
    now: Option<NaiveDateTime>,
}

impl GoogleNewsExtractor {
    /// Extractor resolving relative dates against the local clock at parse time.
    pub fn new(base_url: Url) -> Self {
        Self { base_url, now: None }
    }

    /// Extractor with a fixed reference time.
    pub fn with_reference_time(base_url: Url, now: NaiveDateTime) -> Self {
        Self {
            base_url,
            now: Some(now),
        }
    }

    fn extract(&self, block: ElementRef<'_>, now: NaiveDateTime) -> Result<NewsItem, ExtractError> {
        let href = block
            .select(&LINK)
            .next()
            .ok_or(ExtractError::MissingNode("link"))?
            .value()
            .attr("href")
            .ok_or(ExtractError::MissingAttribute("href"))?;
        let link = self
            .base_url
            .join(href)
            .map_err(|_| ExtractError::MissingAttribute("href"))?
            .to_string();

        let title = required_text(block, &TITLE, "title")?;
        let snippet = node_text(block, &SNIPPET, "snippet")?;
        let raw_date = node_text(block, &DATE, "date")?;
        let date = parse_flexible_date(&raw_date, now)
            .ok_or_else(|| ExtractError::UnparseableDate(raw_date.clone()))?;
        let source = required_text(block, &SOURCE, "source")?;

        Ok(NewsItem {
            link,
            title,
            snippet,
            date,
            source,
        })
    }
}

impl ResultExtractor for GoogleNewsExtractor {
    fn parse(&self, page: &str) -> ParsedPage {
        let document = Html::parse_document(page);
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());

        let mut candidates = Vec::new();
        for (index, block) in document.select(&RESULT_BLOCK).enumerate() {
            match self.extract(block, now) {
                Ok(item) => candidates.push(item),
                Err(e) => warn!(index, error = %e, "Skipping result block"),
            }
        }
        let has_next_page = document.select(&NEXT_PAGE).next().is_some();

        debug!(candidates = candidates.len(), has_next_page, "Parsed results page");
        ParsedPage {
            candidates,
            has_next_page,
        }
    }
}

fn node_text(block: ElementRef<'_>, sel: &Selector, field: &'static str) -> Result<String, ExtractError> {
    let node = block.select(sel).next().ok_or(ExtractError::MissingNode(field))?;
    Ok(node
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" "))
}

fn required_text(block: ElementRef<'_>, sel: &Selector, field: &'static str) -> Result<String, ExtractError> {
    let text = node_text(block, sel, field)?;
    if text.is_empty() {
        return Err(ExtractError::EmptyField(field));
    }
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::NaiveDate;

    const FIXTURE: &str = include_str!("fixtures/google_news_results.html");

    fn extractor() -> GoogleNewsExtractor {
        let now = NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        GoogleNewsExtractor::with_reference_time(Url::parse("https://www.google.com/search").unwrap(), now)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixture_page_contract() {
        let parsed = extractor().parse(FIXTURE);

        assert!(parsed.has_next_page);
        let titles: Vec<&str> = parsed.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Apple shares rise after strong iPhone sales in China",
                "Apple faces EU scrutiny over App Store rules",
                "Analysts raise Apple price targets ahead of earnings",
            ]
        );

        let first = &parsed.candidates[0];
        assert_eq!(first.link, "https://www.reuters.com/technology/apple-shares-rise-2024-01-18/");
        assert_eq!(first.source, "Reuters");
        assert_eq!(first.date, ymd(2024, 1, 18));
        assert!(first.snippet.starts_with("Apple Inc shares climbed"));

        assert_eq!(parsed.candidates[1].date, ymd(2024, 1, 5));
        assert_eq!(parsed.candidates[2].date, ymd(2024, 1, 20));
    }

    #[test]
    fn test_malformed_block_does_not_affect_siblings() {
        let missing_title = r#"<div class="SoaBEf"><a href="https://example.com/x">
<div class="GI74Re">snippet</div><div class="LfVVr">1 day ago</div>
<div class="NUnG9d"><span>AP</span></div></a></div>"#
            .to_string();
        let html = page(
            &[
                block("https://example.com/a", "First", "s1", "2 days ago", "AP"),
                missing_title,
                block("https://example.com/b", "Third", "s3", "someday", "AP"),
                block("https://example.com/c", "Fourth", "s4", "Jan 3, 2024", "CNBC"),
            ],
            false,
        );

        let parsed = extractor().parse(&html);

        let titles: Vec<&str> = parsed.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Fourth"]);
        assert!(!parsed.has_next_page);
    }

    #[test]
    fn test_relative_links_are_resolved() {
        let html = page(&[block("/url?q=https://example.com/a", "T", "S", "Jan 3, 2024", "AP")], false);
        let parsed = extractor().parse(&html);
        assert_eq!(parsed.candidates[0].link, "https://www.google.com/url?q=https://example.com/a");
    }

    #[test]
    fn test_empty_page() {
        let parsed = extractor().parse("<html><body><p>No results</p></body></html>");
        assert_eq!(parsed, ParsedPage::default());
    }

    #[test]
    fn test_block_without_link_is_skipped() {
        let html = r#"<div class="SoaBEf"><div class="MBeuO">Title</div><div class="GI74Re">S</div>
<div class="LfVVr">1 day ago</div><div class="NUnG9d"><span>AP</span></div></div>"#;
        let document = Html::parse_document(html);
        let block = document.select(&RESULT_BLOCK).next().unwrap();
        let err = extractor().extract(block, Local::now().naive_local()).unwrap_err();
        assert_eq!(err, ExtractError::MissingNode("link"));
    }
}

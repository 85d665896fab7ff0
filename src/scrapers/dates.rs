//! Date handling for the scraper.
//!
//! Two very different inputs need parsing:
//!
//! - **Caller input** ([`DateRange::parse`]): strict, only `YYYY-MM-DD` or
//!   `MM/DD/YYYY`. Anything else is a [`ScrapeError::MalformedDateInput`].
//! - **Page text** ([`parse_flexible_date`]): whatever the results page prints
//!   next to a headline, e.g. `3 hours ago`, `Yesterday`, `Jan 5, 2024` or
//!   `5 Jan`. Failure here is an ordinary `None`.

use crate::error::ScrapeError;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Date format the search endpoint expects in its `cd_min`/`cd_max` filter.
const QUERY_FORMAT: &str = "%m/%d/%Y";

const FULL_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%A, %B %d, %Y",
];

const YEARLESS_FORMATS: [&str; 2] = ["%B %d %Y", "%d %B %Y"];

static SEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsept\b").expect("sept pattern"));

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+|an?|one)\s*([a-z]+)\s+ago$").expect("relative date pattern")
});

/// Inclusive calendar range requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Normalize a pair of caller-supplied date strings.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::MalformedDateInput`] naming the first string that is
    /// neither `YYYY-MM-DD` nor `MM/DD/YYYY`.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            start: parse_input_date(start)?,
            end: parse_input_date(end)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `true` when no date can satisfy the range (`start > end`).
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Lower bound formatted for the outbound query.
    pub fn query_start(&self) -> String {
        self.start.format(QUERY_FORMAT).to_string()
    }

    /// Upper bound formatted for the outbound query.
    pub fn query_end(&self) -> String {
        self.end.format(QUERY_FORMAT).to_string()
    }
}

/// Parse one caller-supplied date in either accepted form.
pub fn parse_input_date(input: &str) -> Result<NaiveDate, ScrapeError> {
    let trimmed = input.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ScrapeError::MalformedDateInput {
            input: input.to_string(),
        })
}

/// Leniently parse the free-text date printed on a results page.
///
/// `now` anchors relative expressions (`2 days ago`) and supplies the year for
/// month-day text (`Jan 5`). A yearless date that would land after `now` is
/// taken to mean the previous year.
pub fn parse_flexible_date(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return None;
    }

    let lower = cleaned.to_lowercase();
    match lower.as_str() {
        "just now" | "now" | "today" => return Some(now.date()),
        "yesterday" => return now.date().checked_sub_days(Days::new(1)),
        _ => {}
    }
    // "5 min. ago", "2 hrs. ago"
    let relative_text = lower.replace('.', "");
    if let Some(caps) = RELATIVE.captures(&relative_text) {
        return relative(&caps[1], &caps[2], now);
    }

    let absolute = SEPT.replace_all(&cleaned, "Sep").into_owned();
    if let Some(date) = parse_absolute(&absolute) {
        return Some(date);
    }
    // Abbreviation dots ("Jan. 5, 2024") only when the text is not numeric.
    if absolute.chars().any(|c| c.is_ascii_alphabetic()) && absolute.contains('.') {
        let undotted = absolute.replace('.', "");
        if let Some(date) = parse_absolute(&undotted) {
            return Some(date);
        }
        return parse_yearless(&undotted, now);
    }
    parse_yearless(&absolute, now)
}

fn clean(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '·' | '•' | '-' | '|'))
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_absolute(text: &str) -> Option<NaiveDate> {
    FULL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_yearless(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    if !text.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let today = now.date();
    let with_year = format!("{} {}", text.trim_end_matches(','), today.year());
    let date = YEARLESS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())?;
    if date > today {
        date.with_year(today.year() - 1)
    } else {
        Some(date)
    }
}

fn relative(amount: &str, unit: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    let n: u32 = match amount {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    let today = now.date();
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => {
            Some(now.checked_sub_signed(TimeDelta::try_seconds(n.into())?)?.date())
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            Some(now.checked_sub_signed(TimeDelta::try_minutes(n.into())?)?.date())
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            Some(now.checked_sub_signed(TimeDelta::try_hours(n.into())?)?.date())
        }
        "d" | "day" | "days" => today.checked_sub_days(Days::new(n.into())),
        "w" | "wk" | "wks" | "week" | "weeks" => {
            today.checked_sub_days(Days::new(u64::from(n) * 7))
        }
        "mo" | "mos" | "month" | "months" => today.checked_sub_months(Months::new(n)),
        "y" | "yr" | "yrs" | "year" | "years" => {
            today.checked_sub_months(Months::new(n.checked_mul(12)?))
        }
        _ => None,
    }
}

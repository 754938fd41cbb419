//! Publication-date extraction, from the most to the least reliable signal.

use crate::html::selector;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

fn iso_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex"))
}

fn bounded_iso_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("valid date regex"))
}

fn month_day_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\s+(\d{1,2}),\s+(\d{4})").expect("valid date regex"))
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// First `YYYY-MM-DD` in `s` that is a real calendar date.
pub fn first_iso_date(s: &str) -> Option<NaiveDate> {
    iso_date_regex().find_iter(s).find_map(|m| parse_iso(m.as_str()))
}

/// `Month DD, YYYY` in running text.
pub fn month_day_year(text: &str) -> Option<NaiveDate> {
    month_day_year_regex().captures_iter(text).find_map(|caps| {
        let month = month_number(&caps[1])?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn from_selector(document: &Html, css: &str) -> Option<NaiveDate> {
    let parsed = match Selector::parse(css) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored date selector '{}' does not parse: {:?}", css, e);
            return None;
        }
    };
    let el = document.select(&parsed).next()?;
    let raw = match el.value().attr("datetime") {
        Some(dt) if !dt.trim().is_empty() => dt.to_string(),
        _ => el.text().collect::<String>(),
    };
    first_iso_date(&raw)
}

fn from_meta(document: &Html) -> Option<NaiveDate> {
    let candidates = [
        ("meta[property='article:published_time']", "content"),
        ("meta[name='publish_date']", "content"),
        ("time[datetime]", "datetime"),
    ];
    candidates.iter().find_map(|(css, attr)| {
        document
            .select(&selector(css))
            .next()
            .and_then(|el| el.value().attr(attr))
            .and_then(first_iso_date)
    })
}

/// Publish date by, in order: the site's stored CSS selector, publication
/// meta tags, any bare ISO date in the raw HTML, a `Month DD, YYYY` phrase
/// in the page text.
pub fn extract_publish_date(
    document: &Html,
    raw_html: &str,
    text: &str,
    date_selector: Option<&str>,
) -> Option<NaiveDate> {
    date_selector
        .filter(|css| !css.trim().is_empty())
        .and_then(|css| from_selector(document, css))
        .or_else(|| from_meta(document))
        .or_else(|| {
            bounded_iso_date_regex()
                .find_iter(raw_html)
                .find_map(|m| parse_iso(m.as_str()))
        })
        .or_else(|| month_day_year(text))
}

//! Best-effort parsing of the loosely formatted text the catalog shows.
//!
//! Every function here is total: unrecognised input yields `None` or
//! [`StockStatus::Unknown`], never an error.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use shelfscan_core::StockStatus;

static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:rs\.?|pkr|rupees?)|₨").expect("valid currency regex")
});
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid amount regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Highest score on the catalog's rating scale.
const MAX_RATING: f64 = 5.0;

const OUT_OF_STOCK_PHRASES: [&str; 6] = [
    "out of stock",
    "sold out",
    "unavailable",
    "not available",
    "false",
    "no stock",
];
const IN_STOCK_PHRASES: [&str; 5] = ["in stock", "available", "true", "yes", "only"];

/// Parses the first currency amount in `text`.
///
/// Currency tokens (`Rs.`, `PKR`, `₨`, `rupee(s)`) and thousands separators
/// are ignored. Returns `None` when no amount is present.
///
/// # Examples
///
/// - `"Rs. 1,299"` → `1299`
/// - `"PKR 450.50"` → `450.5`
/// - `"₨ 2,000 - ₨ 2,500"` → `2000`
/// - `"Price on request"` → `None`
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let stripped = CURRENCY_RE.replace_all(text, " ");
    let amount = AMOUNT_RE.find(&stripped)?;
    let digits: String = amount.as_str().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&digits).ok().map(|d| d.normalize())
}

/// Interprets a stock hint as displayed or as sent by the structured endpoint.
///
/// Booleans and counts come through as their text form (`"true"`, `"0"`).
#[must_use]
pub fn parse_stock(text: &str) -> StockStatus {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return StockStatus::Unknown;
    }

    if let Ok(count) = lower.parse::<i64>() {
        return if count > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        };
    }

    // Negative phrases first: "not available" contains "available".
    if OUT_OF_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
        StockStatus::OutOfStock
    } else if IN_STOCK_PHRASES.iter().any(|p| lower.contains(p)) {
        StockStatus::InStock
    } else {
        StockStatus::Unknown
    }
}

/// First number in `text`, accepted only within the 0–5 rating scale.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    let value: f64 = m.as_str().parse().ok()?;
    (0.0..=MAX_RATING).contains(&value).then_some(value)
}

/// Trims and collapses internal whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Truncates to at most `max_chars` characters, never splitting a character.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;

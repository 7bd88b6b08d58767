//! Best-effort normalization of the free-form date text shown on event cards.
//!
//! Listings print dates like `03 February, 10 February, 17 February 2026`
//! for recurring events, `Wednesday 4th March 2026` for single ones, and
//! occasionally numeric `03/02/2026`. Only the first occurrence is kept and
//! numeric dates are read day-first. Anything that cannot be read yields
//! `None`; callers treat that as "no date", not as an error.

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?:[:.]\d{2})?\s*(?:am|pm)\b|\b\d{1,2}:\d{2}\b")
        .expect("valid time regex")
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const FILLER_WORDS: [&str; 4] = ["of", "the", "on", "at"];

/// Normalizes scraped date text to `YYYY-MM-DD`.
pub fn normalize_date(text: &str) -> Option<String> {
    parse_event_date(text).map(|date| date.format("%Y-%m-%d").to_string())
}

pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    let first = text.split(',').next().unwrap_or_default().trim();
    if first.is_empty() {
        return None;
    }

    let mut candidate = first.to_string();
    if !contains_plausible_year(first) {
        // "03 February, 10 February 2026" only carries the year on the last date
        if let Some(year) = text
            .split_whitespace()
            .find(|word| word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()))
        {
            candidate.push(' ');
            candidate.push_str(year);
        }
    }

    parse_day_first(&candidate)
}

fn contains_plausible_year(text: &str) -> bool {
    YEAR_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<i32>().ok())
        .any(|year| (MIN_YEAR..=MAX_YEAR).contains(&year))
}

/// Reads a single date, day before month when the order is ambiguous.
/// Unknown words fail the parse rather than being skipped.
fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let without_times = TIME_RE.replace_all(text, " ");
    let cleaned = ORDINAL_RE.replace_all(&without_times, "$1");

    let mut numbers: Vec<u32> = Vec::new();
    let mut month_name: Option<u32> = None;
    let mut year: Option<i32> = None;
    let mut year_first = false;

    let tokens = cleaned
        .split(|c: char| c.is_whitespace() || matches!(c, '/' | '-' | '.'))
        .filter(|token| !token.is_empty());

    for token in tokens {
        if token.chars().all(|c| !c.is_alphanumeric()) {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            match token.len() {
                4 => {
                    if year.is_some() {
                        return None;
                    }
                    year_first = numbers.is_empty() && month_name.is_none();
                    year = Some(token.parse().ok()?);
                }
                1 | 2 => numbers.push(token.parse().ok()?),
                _ => return None,
            }
            continue;
        }

        let lower = token.to_lowercase();
        if let Some(month) = month_from_name(&lower) {
            if month_name.replace(month).is_some() {
                return None;
            }
        } else if !is_weekday(&lower) && !FILLER_WORDS.contains(&lower.as_str()) {
            return None;
        }
    }

    let (day, month, year) = match (month_name, numbers.as_slice(), year) {
        (Some(month), [day], Some(year)) => (*day, month, year),
        (Some(month), [day, short_year], None) => (*day, month, expand_year(*short_year)),
        (None, [month, day], Some(year)) if year_first => (*day, *month, year),
        (None, [first, second], Some(year)) => day_first(*first, *second, year),
        (None, [first, second, short_year], None) => {
            day_first(*first, *second, expand_year(*short_year))
        }
        _ => return None,
    };

    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Day-first unless that would put the month past December.
fn day_first(first: u32, second: u32, year: i32) -> (u32, u32, i32) {
    if second > 12 && first <= 12 {
        (second, first, year)
    } else {
        (first, second, year)
    }
}

fn expand_year(short: u32) -> i32 {
    expand_year_around(short, Utc::now().year())
}

/// Two-digit years land in whichever century puts them less than 50
/// years from `reference`: in 2026, `26` is 2026, `75` is 2075, `76` is
/// 1976 and `99` is 1999.
fn expand_year_around(short: u32, reference: i32) -> i32 {
    let year = reference - reference.rem_euclid(100) + short as i32;
    if year - reference >= 50 {
        year - 100
    } else if reference - year >= 50 {
        year + 100
    } else {
        year
    }
}

fn month_from_name(word: &str) -> Option<u32> {
    if word == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|month| *month == word || (word.len() == 3 && month.starts_with(word)))
        .map(|idx| idx as u32 + 1)
}

fn is_weekday(word: &str) -> bool {
    matches!(word, "tues" | "thur" | "thurs")
        || WEEKDAYS
            .iter()
            .any(|day| *day == word || (word.len() == 3 && day.starts_with(word)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurring_dates_take_first_with_trailing_year() {
        assert_eq!(
            normalize_date("03 February, 10 February, 17 February 2026").as_deref(),
            Some("2026-02-03")
        );
        assert_eq!(
            normalize_date("Monday 2 March, Monday 9 March 2026").as_deref(),
            Some("2026-03-02")
        );
    }

    #[test]
    fn single_dates() {
        assert_eq!(normalize_date("15 March 2025").as_deref(), Some("2025-03-15"));
        assert_eq!(normalize_date("12 June 2026").as_deref(), Some("2026-06-12"));
        assert_eq!(normalize_date("Sept 9 2026").as_deref(), Some("2026-09-09"));
        assert_eq!(normalize_date("12 Jun 26").as_deref(), Some("2026-06-12"));
    }

    #[test]
    fn ordinal_suffixes_and_weekdays() {
        assert_eq!(normalize_date("1st March 2026").as_deref(), Some("2026-03-01"));
        assert_eq!(
            normalize_date("Wednesday 4th of March 2026").as_deref(),
            Some("2026-03-04")
        );
        assert_eq!(normalize_date("Thu 22nd Oct 2026").as_deref(), Some("2026-10-22"));
    }

    #[test]
    fn numeric_dates_are_day_first() {
        assert_eq!(normalize_date("03/02/2026").as_deref(), Some("2026-02-03"));
        assert_eq!(normalize_date("3.2.2026").as_deref(), Some("2026-02-03"));
        assert_eq!(normalize_date("03-02-26").as_deref(), Some("2026-02-03"));
        assert_eq!(normalize_date("2026-02-03").as_deref(), Some("2026-02-03"));
        // month cannot be 25, so the order flips
        assert_eq!(normalize_date("12/25/2026").as_deref(), Some("2026-12-25"));
    }

    #[test]
    fn clock_times_are_ignored() {
        assert_eq!(
            normalize_date("12 June 2026 5:30pm").as_deref(),
            Some("2026-06-12")
        );
        assert_eq!(
            normalize_date("Friday 12 June 2026 12pm – 2pm").as_deref(),
            Some("2026-06-12")
        );
    }

    #[test]
    fn unreadable_text_is_absent() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
        assert_eq!(normalize_date("TBA"), None);
        assert_eq!(normalize_date("Join us for a free lunch"), None);
        assert_eq!(normalize_date("31 February 2026"), None);
        assert_eq!(normalize_date("45/13/2026"), None);
    }

    #[test]
    fn missing_year_is_absent() {
        assert_eq!(normalize_date("12 June"), None);
        assert_eq!(normalize_date("03 February, 10 February"), None);
    }

    #[test]
    fn two_digit_years_pick_the_nearest_century() {
        assert_eq!(expand_year_around(26, 2026), 2026);
        assert_eq!(expand_year_around(75, 2026), 2075);
        assert_eq!(expand_year_around(76, 2026), 1976);
        assert_eq!(expand_year_around(99, 2026), 1999);
        assert_eq!(expand_year_around(0, 2026), 2000);
        assert_eq!(expand_year_around(10, 2090), 2110);
        assert_eq!(expand_year_around(95, 2010), 1995);

        assert_eq!(normalize_date("12 Jun 99").as_deref(), Some("1999-06-12"));
        assert_eq!(normalize_date("31/12/99").as_deref(), Some("1999-12-31"));
    }

    #[test]
    fn implausible_year_in_segment_borrows_from_full_text() {
        // "1200" is not a plausible year, so the first 4-digit word ("1200"
        // again) is appended and the segment ends up with two year tokens.
        assert_eq!(normalize_date("1200 3 March, 2026"), None);
    }
}

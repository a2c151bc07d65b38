//! Date recognition from free text
//!
//! Finds date mentions in an utterance and resolves each to a timex
//! expression. Supported forms:
//! - ISO dates: "2021-03-22"
//! - US numeric dates: "3/22/2021"
//! - Month first: "March 22", "Mar 22nd, 2021"
//! - Day first: "22 March", "the 22nd of March 2021"
//! - Month and year: "March 2021"
//! - Relative days: "today", "tomorrow", "yesterday", "day after tomorrow"
//! - Weekdays: "friday", "this friday", "next friday", "last friday"
//!
//! Mentions without a year resolve to a non-definite timex
//! (`XXXX-03-22`, `XXXX-WXX-5`), which the date dialogs reject.

use crate::timex::TimexProperty;
use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b{}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?",
        MONTH
    ))
    .unwrap()
});

static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{}\b\.?(?:,?\s+(\d{{4}})\b)?",
        MONTH
    ))
    .unwrap()
});

static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{}\s+(\d{{4}})\b", MONTH)).unwrap());

static RELATIVE_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(day after tomorrow|today|tonight|tomorrow|yesterday)\b").unwrap()
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:(next|this|last)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .unwrap()
});

/// A date mention found in text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeResolution {
    /// Resolved timex expression
    pub timex: String,
    /// Matched text
    pub text: String,
    /// Byte offset of the match
    pub start: usize,
}

impl DateTimeResolution {
    pub fn property(&self) -> Option<TimexProperty> {
        TimexProperty::parse(&self.timex).ok()
    }

    pub fn is_definite(&self) -> bool {
        self.property().map(|p| p.is_definite()).unwrap_or(false)
    }
}

/// Rule-based English date recognizer
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeRecognizer;

impl DateTimeRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Find every date mention in `text`
    ///
    /// `reference` anchors relative expressions. Overlapping candidates are
    /// resolved in favour of the earliest, then the longest, match.
    pub fn recognize(&self, text: &str, reference: NaiveDate) -> Vec<DateTimeResolution> {
        let mut candidates: Vec<(usize, usize, String)> = Vec::new();

        for caps in ISO_DATE.captures_iter(text) {
            let m = caps.get(0).map(|m| (m.start(), m.end()));
            let date = (
                caps[1].parse::<i32>().ok(),
                caps[2].parse::<u32>().ok(),
                caps[3].parse::<u32>().ok(),
            );
            if let (Some((start, end)), (Some(y), Some(mo), Some(d))) = (m, date) {
                if let Some(timex) = definite_timex(y, mo, d) {
                    candidates.push((start, end, timex));
                }
            }
        }

        for caps in US_DATE.captures_iter(text) {
            let m = caps.get(0).map(|m| (m.start(), m.end()));
            let date = (
                caps[3].parse::<i32>().ok(),
                caps[1].parse::<u32>().ok(),
                caps[2].parse::<u32>().ok(),
            );
            if let (Some((start, end)), (Some(y), Some(mo), Some(d))) = (m, date) {
                if let Some(timex) = definite_timex(y, mo, d) {
                    candidates.push((start, end, timex));
                }
            }
        }

        for caps in MONTH_DAY.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let month = month_number(&caps[1]);
            let day = caps[2].parse::<u32>().ok();
            let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
            if let Some(timex) = calendar_timex(year, month, day) {
                candidates.push((m.start(), m.end(), timex));
            }
        }

        for caps in DAY_MONTH.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let day = caps[1].parse::<u32>().ok();
            let month = month_number(&caps[2]);
            let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
            if let Some(timex) = calendar_timex(year, month, day) {
                candidates.push((m.start(), m.end(), timex));
            }
        }

        for caps in MONTH_YEAR.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let month = month_number(&caps[1]);
            let year = caps[2].parse::<i32>().ok();
            if let (Some(month), Some(year)) = (month, year) {
                candidates.push((m.start(), m.end(), format!("{:04}-{:02}", year, month)));
            }
        }

        for caps in RELATIVE_DAY.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let offset = match caps[1].to_lowercase().as_str() {
                "yesterday" => -1,
                "tomorrow" => 1,
                "day after tomorrow" => 2,
                _ => 0,
            };
            let date = reference + Duration::days(offset);
            candidates.push((m.start(), m.end(), date.format("%Y-%m-%d").to_string()));
        }

        for caps in WEEKDAY.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let Some(day) = weekday_number(&caps[2]) else {
                continue;
            };
            let modifier = caps.get(1).map(|m| m.as_str().to_lowercase());
            let timex = match modifier.as_deref() {
                None => format!("XXXX-WXX-{}", day),
                Some(modifier) => {
                    let this_week = reference
                        - Duration::days(reference.weekday().num_days_from_monday() as i64)
                        + Duration::days(day as i64 - 1);
                    let date = match modifier {
                        "next" => this_week + Duration::days(7),
                        "last" => this_week - Duration::days(7),
                        _ => this_week,
                    };
                    date.format("%Y-%m-%d").to_string()
                },
            };
            candidates.push((m.start(), m.end(), timex));
        }

        candidates.sort_by(|a, b| a.0.cmp(&b.0).then((b.1 - b.0).cmp(&(a.1 - a.0))));

        let mut resolutions = Vec::new();
        let mut covered_until = 0;
        for (start, end, timex) in candidates {
            if start < covered_until {
                continue;
            }
            covered_until = end;
            resolutions.push(DateTimeResolution {
                timex,
                text: text[start..end].to_string(),
                start,
            });
        }

        resolutions
    }
}

fn definite_timex(year: i32, month: u32, day: u32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn calendar_timex(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<String> {
    let (month, day) = (month?, day?);
    match year {
        Some(year) => definite_timex(year, month, day),
        // Leap year so that February 29th is accepted without a year
        None => NaiveDate::from_ymd_opt(2000, month, day)
            .map(|_| format!("XXXX-{:02}-{:02}", month, day)),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_number(name: &str) -> Option<u32> {
    let day = match name.to_lowercase().as_str() {
        "monday" => 1,
        "tuesday" => 2,
        "wednesday" => 3,
        "thursday" => 4,
        "friday" => 5,
        "saturday" => 6,
        "sunday" => 7,
        _ => return None,
    };
    Some(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        // A Wednesday
        NaiveDate::from_ymd_opt(2021, 3, 10).unwrap()
    }

    fn timexes(text: &str) -> Vec<String> {
        DateTimeRecognizer::new()
            .recognize(text, reference())
            .into_iter()
            .map(|r| r.timex)
            .collect()
    }

    #[test]
    fn test_full_dates() {
        assert_eq!(timexes("2021-03-22"), vec!["2021-03-22"]);
        assert_eq!(timexes("on 3/22/2021 please"), vec!["2021-03-22"]);
        assert_eq!(timexes("March 22, 2021"), vec!["2021-03-22"]);
        assert_eq!(timexes("mar 22nd 2021"), vec!["2021-03-22"]);
        assert_eq!(timexes("the 22nd of March 2021"), vec!["2021-03-22"]);
        assert_eq!(timexes("22 march, 2021"), vec!["2021-03-22"]);
    }

    #[test]
    fn test_partial_dates_are_not_definite() {
        let resolutions = DateTimeRecognizer::new().recognize("march 22", reference());
        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].timex, "XXXX-03-22");
        assert!(!resolutions[0].is_definite());

        assert_eq!(timexes("friday"), vec!["XXXX-WXX-5"]);
        assert_eq!(timexes("March 2021"), vec!["2021-03"]);
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(timexes("today"), vec!["2021-03-10"]);
        assert_eq!(timexes("Tomorrow"), vec!["2021-03-11"]);
        assert_eq!(timexes("yesterday"), vec!["2021-03-09"]);
        assert_eq!(timexes("the day after tomorrow"), vec!["2021-03-12"]);
    }

    #[test]
    fn test_anchored_weekdays() {
        assert_eq!(timexes("this friday"), vec!["2021-03-12"]);
        assert_eq!(timexes("next friday"), vec!["2021-03-19"]);
        assert_eq!(timexes("last monday"), vec!["2021-03-01"]);
    }

    #[test]
    fn test_invalid_dates_are_skipped() {
        assert!(timexes("2021-02-30").is_empty());
        assert!(timexes("February 30").is_empty());
        assert_eq!(timexes("February 29"), vec!["XXXX-02-29"]);
    }

    #[test]
    fn test_no_dates() {
        assert!(timexes("").is_empty());
        assert!(timexes("sometime soon").is_empty());
        assert!(timexes("22").is_empty());
    }

    #[test]
    fn test_multiple_mentions_in_order() {
        let resolutions =
            DateTimeRecognizer::new().recognize("from tomorrow until March 22, 2021", reference());
        let found: Vec<_> = resolutions.iter().map(|r| r.timex.as_str()).collect();
        assert_eq!(found, vec!["2021-03-11", "2021-03-22"]);
        assert_eq!(resolutions[1].text, "March 22, 2021");
        assert!(resolutions[0].start < resolutions[1].start);
    }
}

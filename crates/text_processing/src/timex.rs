//! Timex expressions
//!
//! A timex is the ISO-8601 flavoured string the date recognizers produce,
//! where unknown components are written as `X`:
//!
//! | timex                          | meaning                  |
//! |--------------------------------|--------------------------|
//! | `2021-03-22`                   | a fully specified date   |
//! | `XXXX-03-22`                   | March 22nd, any year     |
//! | `XXXX-WXX-5`                   | some Friday              |
//! | `2021-03`                      | March 2021               |
//! | `2021-03-22T10:30`             | date and time            |
//! | `TEV`                          | in the evening           |
//! | `P3D`                          | a duration of three days |
//! | `PRESENT_REF`                  | now                      |
//! | `(2021-03-01,2021-03-05,P4D)`  | a date range             |
//!
//! Only the fully specified ("definite") dates are good enough to book a
//! flight; [`TimexProperty::is_definite`] is the check the dialogs use.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Categories a timex expression falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimexType {
    Present,
    /// Year, month and day are all known
    Definite,
    Date,
    DateRange,
    Duration,
    Time,
    TimeRange,
    DateTime,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimexError {
    #[error("empty timex expression")]
    Empty,

    #[error("invalid timex '{0}'")]
    Invalid(String),
}

/// Parsed components of a timex expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimexProperty {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day_of_month: Option<u32>,
    /// ISO day of week, Monday = 1
    pub day_of_week: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    /// `MO`, `AF`, `EV` or `NI`
    pub part_of_day: Option<String>,
    pub now: bool,
    pub duration: Option<String>,
    pub range: bool,
}

const PARTS_OF_DAY: [&str; 4] = ["MO", "AF", "EV", "NI"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl TimexProperty {
    /// Parse a timex expression
    pub fn parse(timex: &str) -> Result<Self, TimexError> {
        let timex = timex.trim();
        if timex.is_empty() {
            return Err(TimexError::Empty);
        }

        let invalid = || TimexError::Invalid(timex.to_string());
        let mut property = Self::default();

        if timex == "PRESENT_REF" {
            property.now = true;
            return Ok(property);
        }

        if timex.starts_with('(') {
            if !timex.ends_with(')') || timex.split(',').count() != 3 {
                return Err(invalid());
            }
            property.range = true;
            return Ok(property);
        }

        if let Some(rest) = timex.strip_prefix('P') {
            if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
                return Err(invalid());
            }
            property.duration = Some(timex.to_string());
            return Ok(property);
        }

        let (date_part, time_part) = match timex.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (timex, None),
        };

        if !date_part.is_empty() {
            property.parse_date(date_part).ok_or_else(invalid)?;
        }

        if let Some(time) = time_part {
            property.parse_time(time).ok_or_else(invalid)?;
        }

        Ok(property)
    }

    fn parse_date(&mut self, date: &str) -> Option<()> {
        let segments: Vec<&str> = date.split('-').collect();
        if segments.len() > 3 {
            return None;
        }

        let year = segments[0];
        if year.len() != 4 {
            return None;
        }
        if year != "XXXX" {
            self.year = Some(parse_number(year)? as i32);
        }

        let Some(month) = segments.get(1) else {
            return Some(());
        };

        if let Some(week) = month.strip_prefix('W') {
            // Week-based form: XXXX-WXX-5
            if week != "XX" {
                parse_number(week)?;
                self.range = true;
            }
            if let Some(day) = segments.get(2) {
                let day = parse_number(day)?;
                if !(1..=7).contains(&day) {
                    return None;
                }
                self.day_of_week = Some(day);
            }
            return Some(());
        }

        if *month != "XX" {
            let month = parse_number(month)?;
            if !(1..=12).contains(&month) {
                return None;
            }
            self.month = Some(month);
        }

        if let Some(day) = segments.get(2) {
            if *day != "XX" {
                let day = parse_number(day)?;
                if !(1..=31).contains(&day) {
                    return None;
                }
                self.day_of_month = Some(day);
            }
        }

        Some(())
    }

    fn parse_time(&mut self, time: &str) -> Option<()> {
        if PARTS_OF_DAY.contains(&time) {
            self.part_of_day = Some(time.to_string());
            return Some(());
        }

        let mut parts = time.split(':');
        let hour = parse_number(parts.next()?)?;
        if hour > 24 {
            return None;
        }
        self.hour = Some(hour);

        if let Some(minute) = parts.next() {
            let minute = parse_number(minute)?;
            if minute > 59 {
                return None;
            }
            self.minute = Some(minute);
        }

        if let Some(second) = parts.next() {
            let second = parse_number(second)?;
            if second > 59 {
                return None;
            }
            self.second = Some(second);
        }

        parts.next().is_none().then_some(())
    }

    /// Year, month and day are all specified and name a real calendar day
    pub fn is_definite(&self) -> bool {
        self.date().is_some()
    }

    /// All categories this expression belongs to
    pub fn types(&self) -> BTreeSet<TimexType> {
        let mut types = BTreeSet::new();

        if self.now {
            types.insert(TimexType::Present);
        }

        if self.is_definite() {
            types.insert(TimexType::Definite);
        }

        let is_date = (self.month.is_some() && self.day_of_month.is_some())
            || self.day_of_week.is_some();
        if is_date {
            types.insert(TimexType::Date);
        }

        let partial_calendar = (self.year.is_some() || self.month.is_some())
            && self.day_of_month.is_none()
            && self.day_of_week.is_none();
        if self.range || partial_calendar {
            types.insert(TimexType::DateRange);
        }

        if self.duration.is_some() {
            types.insert(TimexType::Duration);
        }

        if self.hour.is_some() {
            types.insert(TimexType::Time);
        }

        if self.part_of_day.is_some() {
            types.insert(TimexType::TimeRange);
        }

        if is_date && self.hour.is_some() {
            types.insert(TimexType::DateTime);
        }

        types
    }

    /// The calendar date, when definite and valid
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day_of_month?)
    }

    /// Describe the expression in English relative to `reference`
    pub fn to_natural_language(&self, reference: NaiveDate) -> String {
        if self.now {
            return "now".to_string();
        }

        let mut text = if let Some(date) = self.date() {
            relative_date(date, reference)
        } else if let (Some(month), Some(day)) = (self.month, self.day_of_month) {
            format!("{} {}", ordinal(day), month_name(month))
        } else if let Some(day) = self.day_of_week {
            weekday_name(weekday_from_iso(day)).to_string()
        } else if let (Some(year), Some(month)) = (self.year, self.month) {
            format!("{} {}", month_name(month), year)
        } else if let Some(duration) = &self.duration {
            describe_duration(duration)
        } else {
            String::new()
        };

        if let Some(hour) = self.hour {
            let minute = self.minute.unwrap_or(0);
            let time = format!("{}:{:02}", hour, minute);
            text = if text.is_empty() {
                time
            } else {
                format!("{} at {}", text, time)
            };
        } else if let Some(part) = &self.part_of_day {
            let part = match part.as_str() {
                "MO" => "morning",
                "AF" => "afternoon",
                "EV" => "evening",
                _ => "night",
            };
            text = if text.is_empty() {
                part.to_string()
            } else {
                format!("{} {}", text, part)
            };
        }

        if text.is_empty() {
            self.to_string()
        } else {
            text
        }
    }
}

impl FromStr for TimexProperty {
    type Err = TimexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimexProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.now {
            return f.write_str("PRESENT_REF");
        }
        if let Some(duration) = &self.duration {
            return f.write_str(duration);
        }

        let has_date = self.year.is_some()
            || self.month.is_some()
            || self.day_of_month.is_some()
            || self.day_of_week.is_some();

        if has_date {
            match self.year {
                Some(year) => write!(f, "{:04}", year)?,
                None => f.write_str("XXXX")?,
            }
            if let Some(day) = self.day_of_week {
                write!(f, "-WXX-{}", day)?;
            } else {
                match self.month {
                    Some(month) => write!(f, "-{:02}", month)?,
                    None => f.write_str("-XX")?,
                }
                match self.day_of_month {
                    Some(day) => write!(f, "-{:02}", day)?,
                    None if self.year.is_some() && self.month.is_some() => {},
                    None => f.write_str("-XX")?,
                }
            }
        }

        if let Some(hour) = self.hour {
            write!(f, "T{:02}", hour)?;
            if let Some(minute) = self.minute {
                write!(f, ":{:02}", minute)?;
            }
            if let Some(second) = self.second {
                write!(f, ":{:02}", second)?;
            }
        } else if let Some(part) = &self.part_of_day {
            write!(f, "T{}", part)?;
        }

        Ok(())
    }
}

/// Is `timex` a fully specified date?
///
/// Unparseable expressions are never definite.
pub fn is_definite(timex: &str) -> bool {
    TimexProperty::parse(timex)
        .map(|t| t.is_definite())
        .unwrap_or(false)
}

/// Date portion of a timex (`2021-03-22T10:00` → `2021-03-22`)
pub fn date_part(timex: &str) -> &str {
    timex.split('T').next().unwrap_or(timex)
}

fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn relative_date(date: NaiveDate, reference: NaiveDate) -> String {
    match (date - reference).num_days() {
        0 => return "today".to_string(),
        1 => return "tomorrow".to_string(),
        -1 => return "yesterday".to_string(),
        _ => {},
    }

    let weekday = weekday_name(date.weekday());
    let week = date.iso_week();
    if week == reference.iso_week() {
        return format!("this {}", weekday);
    }
    if week == (reference + Duration::days(7)).iso_week() {
        return format!("next {}", weekday);
    }
    if week == (reference - Duration::days(7)).iso_week() {
        return format!("last {}", weekday);
    }

    format!(
        "{} {} {} {}",
        weekday,
        ordinal(date.day()),
        month_name(date.month()),
        date.year()
    )
}

fn describe_duration(duration: &str) -> String {
    let (body, is_time) = match duration.strip_prefix("PT") {
        Some(rest) => (rest, true),
        None => (duration.trim_start_matches('P'), false),
    };

    let Some(unit) = body.chars().last() else {
        return duration.to_string();
    };
    let amount = &body[..body.len() - unit.len_utf8()];

    let unit = match (unit, is_time) {
        ('Y', false) => "year",
        ('M', false) => "month",
        ('W', false) => "week",
        ('D', false) => "day",
        ('H', true) => "hour",
        ('M', true) => "minute",
        ('S', true) => "second",
        _ => return duration.to_string(),
    };

    if amount == "1" {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

pub(crate) fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

pub(crate) fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn weekday_from_iso(day: u32) -> Weekday {
    match day {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Duration, Month};

use crate::Segment;

pub const ISO_LAYOUT: &str = "YYYY-MM-DD";
pub const DISPLAY_LAYOUT: &str = "MM/DD/YYYY";

/// Years a four-digit field can show.
pub const DISPLAY_YEARS: RangeInclusive<i32> = 0..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateInputError {
    Invalid,
    BeforeMinimum,
}

impl std::fmt::Display for DateInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => f.write_str("Invalid date"),
            Self::BeforeMinimum => f.write_str("Date is before minimum date"),
        }
    }
}

impl std::error::Error for DateInputError {}

/// Outcome of reading free text typed into the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayParse {
    Empty,
    /// Fewer than three parts, or a year part that is not exactly four characters.
    Incomplete,
    Invalid,
    Date(Date),
}

impl DisplayParse {
    pub const fn date(self) -> Option<Date> {
        match self {
            Self::Date(date) => Some(date),
            _ => None,
        }
    }

    /// Advisory error for the inline label. Empty and incomplete text carry none.
    pub fn error(self, min_date: Option<Date>) -> Option<DateInputError> {
        match self {
            Self::Invalid => Some(DateInputError::Invalid),
            Self::Date(date) => check_min_date(date, min_date).err(),
            Self::Empty | Self::Incomplete => None,
        }
    }

    /// The date a commit would carry, if any.
    pub fn committable(self, min_date: Option<Date>) -> Option<Date> {
        self.date().and_then(|date| check_min_date(date, min_date).ok())
    }
}

pub fn parse_display(input: &str) -> DisplayParse {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DisplayParse::Empty;
    }

    let parts = trimmed.split('/').collect::<Vec<&str>>();
    let [month, day, year] = parts.as_slice() else {
        return DisplayParse::Incomplete;
    };
    if year.chars().count() != 4 {
        return DisplayParse::Incomplete;
    }

    let (Some(month), Some(day), Some(year)) = (
        parse_digits(month, 1, 2),
        parse_digits(day, 1, 2),
        parse_digits(year, 4, 4),
    ) else {
        return DisplayParse::Invalid;
    };

    let Ok(month) = Month::try_from(month as u8) else {
        return DisplayParse::Invalid;
    };
    match Date::from_calendar_date(year as i32, month, day as u8) {
        Ok(date) => DisplayParse::Date(date),
        Err(_) => DisplayParse::Invalid,
    }
}

pub fn format_display(date: Date) -> String {
    format!("{:02}/{:02}/{:04}", date.month() as u8, date.day(), date.year())
}

pub fn format_optional_display(date: Option<Date>) -> String {
    date.map_or_else(String::new, format_display)
}

pub fn parse_iso(input: &str) -> Option<Date> {
    let input = input.trim();
    if !input.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Date::parse(input, &format_description!("[year]-[month]-[day]"))
        .ok()
        .filter(|date| in_display_range(*date))
}

pub fn in_display_range(date: Date) -> bool {
    DISPLAY_YEARS.contains(&date.year())
}

pub fn format_iso(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

pub fn check_min_date(date: Date, min_date: Option<Date>) -> Result<Date, DateInputError> {
    match min_date {
        Some(min) if date < min => Err(DateInputError::BeforeMinimum),
        _ => Ok(date),
    }
}

/// Steps one segment of `date` by `delta` units. Overflow carries into the
/// next larger unit the way a calendar date constructor normalizes it, so
/// Jan 31 plus one month lands in early March.
pub fn roll_segment(date: Date, segment: Segment, delta: i32) -> Option<Date> {
    let month_index = i32::from(date.month() as u8) - 1;
    let day = i64::from(date.day());
    let rolled = match segment {
        Segment::Month => normalize(date.year(), month_index + delta, day),
        Segment::Day => date.checked_add(Duration::days(i64::from(delta))),
        Segment::Year => normalize(date.year().checked_add(delta)?, month_index, day),
    };
    rolled.filter(|date| in_display_range(*date))
}

fn normalize(year: i32, month_index: i32, day: i64) -> Option<Date> {
    let year = year.checked_add(month_index.div_euclid(12))?;
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    first.checked_add(Duration::days(day - 1))
}

fn parse_digits(input: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if input.len() < min_len || input.len() > max_len {
        return None;
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

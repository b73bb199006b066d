// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, Weekday};

use crate::in_display_range;

pub const WEEKDAY_HEADER: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Movement of the popover highlight. Unlike segment rolling, month and year
/// steps clamp the day so browsing never skips a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarStep {
    Days(i64),
    Months(i32),
    Years(i32),
}

impl CalendarStep {
    /// `None` when the step would leave the four-digit year range.
    pub fn apply(self, date: Date) -> Option<Date> {
        let next = match self {
            Self::Days(days) => shift_date_by_days(date, days),
            Self::Months(months) => shift_date_by_months(date, months),
            Self::Years(years) => shift_date_by_years(date, years),
        };
        next.filter(|next| in_display_range(*next))
    }
}

pub fn shift_date_by_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(Duration::days(days))
}

pub fn shift_date_by_years(date: Date, years: i32) -> Option<Date> {
    shift_date_by_months(date, years.saturating_mul(12))
}

pub fn shift_date_by_months(date: Date, months: i32) -> Option<Date> {
    let total_month = i32::from(date.month() as u8) - 1 + months;
    let year = date.year().checked_add(total_month.div_euclid(12))?;
    let month = Month::try_from((total_month.rem_euclid(12) + 1) as u8).ok()?;
    let max_day = last_day_of_month(year, month)?;
    Date::from_calendar_date(year, month, date.day().min(max_day)).ok()
}

pub fn last_day_of_month(year: i32, month: Month) -> Option<u8> {
    let (next_year, next_month) = if month == Month::December {
        (year.checked_add(1)?, Month::January)
    } else {
        (year, month.next())
    };

    let first_next_month = Date::from_calendar_date(next_year, next_month, 1).ok()?;
    first_next_month.previous_day().map(|last| last.day())
}

/// Weeks of the month containing `date`, Sunday first. Cells outside the
/// month are `None`.
pub fn month_grid(date: Date) -> Vec<[Option<Date>; 7]> {
    let Ok(first) = date.replace_day(1) else {
        return Vec::new();
    };
    let Some(days) = last_day_of_month(first.year(), first.month()) else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut column = usize::from(first.weekday().number_days_from_sunday());
    let mut current = Some(first);
    for _ in 0..days {
        let Some(day) = current else {
            break;
        };
        week[column] = Some(day);
        column += 1;
        if column == 7 {
            weeks.push(week);
            week = [None; 7];
            column = 0;
        }
        current = day.next_day();
    }
    if column > 0 {
        weeks.push(week);
    }
    weeks
}

pub fn month_title(date: Date) -> String {
    format!("{} {:04}", month_name(date.month()), date.year())
}

pub const fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

pub const fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Saturday | Weekday::Sunday)
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use datefield_app::{CaretHandle, CaretRange, DateInputState, FieldProps, FieldRuntime};
use time::{Date, Duration, Month};

const REFERENCE_YEAR: i32 = 2026;

const GARBAGE_FRAGMENTS: [&str; 12] = [
    "zz", "13", "00", "99", "/", "//", "2o24", "abc", "-", " ", "31", "0x",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded source of calendar dates and junk field text.
#[derive(Debug, Clone)]
pub struct DateFaker {
    rng: DeterministicRng,
}

impl DateFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Uniform date in `[start, end)`. Returns `start` when the span is empty.
    pub fn date_between(&mut self, start: Date, end: Date) -> Date {
        let span = (end - start).whole_days();
        if span <= 0 {
            return start;
        }
        let offset = self.rng.int_n(span as usize) as i64;
        start.checked_add(Duration::days(offset)).unwrap_or(start)
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let (Ok(start), Ok(end)) = (
            Date::from_calendar_date(year, Month::January, 1),
            Date::from_calendar_date(year + 1, Month::January, 1),
        ) else {
            return reference_today();
        };
        self.date_between(start, end)
    }

    /// Text a user might type that never forms a complete valid date.
    pub fn garbage_text(&mut self) -> String {
        let pieces = 1 + self.rng.int_n(4);
        let mut text = String::new();
        for _ in 0..pieces {
            text.push_str(GARBAGE_FRAGMENTS[self.rng.int_n(GARBAGE_FRAGMENTS.len())]);
        }
        text
    }
}

/// Caret handle that remembers every range the control asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingCaret {
    pub range: CaretRange,
    pub history: Vec<CaretRange>,
}

impl RecordingCaret {
    pub fn at(offset: usize) -> Self {
        Self {
            range: CaretRange::caret(offset),
            history: Vec::new(),
        }
    }
}

impl CaretHandle for RecordingCaret {
    fn caret(&self) -> CaretRange {
        self.range
    }

    fn set_caret(&mut self, range: CaretRange) {
        self.range = range;
        self.history.push(range);
    }
}

/// Owner that stores whatever it is handed, unless told to keep a pinned value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingOwner {
    pub value: Option<String>,
    pub commits: Vec<Option<String>>,
    pub pinned: Option<Option<String>>,
}

impl RecordingOwner {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: Some(value.to_owned()),
            ..Self::default()
        }
    }

    /// Owner that records commits but always renders `value` back.
    pub fn pinned(value: Option<&str>) -> Self {
        let value = value.map(str::to_owned);
        Self {
            value: value.clone(),
            commits: Vec::new(),
            pinned: Some(value),
        }
    }
}

impl FieldRuntime for RecordingOwner {
    fn commit(&mut self, value: Option<&str>) -> Result<()> {
        self.commits.push(value.map(str::to_owned));
        if self.pinned.is_none() {
            self.value = value.map(str::to_owned);
        }
        Ok(())
    }

    fn value(&self) -> Option<String> {
        match &self.pinned {
            Some(pinned) => pinned.clone(),
            None => self.value.clone(),
        }
    }
}

pub fn field_state(value: Option<&str>, min_date: Option<Date>, clearable: bool) -> DateInputState {
    DateInputState::new(
        FieldProps {
            value: value.map(str::to_owned),
            min_date,
            placeholder: "MM/DD/YYYY".to_owned(),
            clearable,
            label: "Payment date".to_owned(),
        },
        reference_today(),
    )
}

pub fn date(year: i32, month: u8, day: u8) -> Result<Date> {
    let month = Month::try_from(month).map_err(|_| anyhow!("month {month} out of range"))?;
    Date::from_calendar_date(year, month, day)
        .with_context(|| format!("build fixture date {year}-{month}-{day}"))
}

pub fn reference_today() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::February, 19).unwrap_or(Date::MIN)
}

#[cfg(test)]
mod tests {
    use super::{DateFaker, RecordingOwner, date, reference_today};
    use anyhow::Result;
    use datefield_app::{FieldRuntime, parse_display};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut first = DateFaker::new(7);
        let mut second = DateFaker::new(7);
        for _ in 0..20 {
            assert_eq!(first.date_in_year(2024), second.date_in_year(2024));
        }
    }

    #[test]
    fn date_between_stays_in_range() -> Result<()> {
        let start = date(2024, 2, 1)?;
        let end = date(2024, 3, 1)?;
        let mut faker = DateFaker::new(42);
        for _ in 0..200 {
            let value = faker.date_between(start, end);
            assert!(value >= start && value < end, "got {value}");
        }
        assert_eq!(faker.date_between(end, start), end);
        Ok(())
    }

    #[test]
    fn garbage_text_never_parses_to_a_date() {
        let mut faker = DateFaker::new(3);
        for _ in 0..200 {
            let text = faker.garbage_text();
            assert_eq!(parse_display(&text).date(), None, "text {text:?}");
        }
    }

    #[test]
    fn pinned_owner_ignores_commits() -> Result<()> {
        let mut owner = RecordingOwner::pinned(Some("2024-01-01"));
        owner.commit(Some("2024-02-02"))?;
        assert_eq!(owner.value().as_deref(), Some("2024-01-01"));
        assert_eq!(owner.commits, vec![Some("2024-02-02".to_owned())]);
        Ok(())
    }

    #[test]
    fn reference_today_is_fixed() -> Result<()> {
        assert_eq!(reference_today(), date(2026, 2, 19)?);
        Ok(())
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

/// Character width of a fully formatted `MM/DD/YYYY` value.
pub const DISPLAY_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Month,
    Day,
    Year,
}

impl Segment {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Day => "day",
            Self::Year => "year",
        }
    }

    pub const fn range(self) -> CaretRange {
        match self {
            Self::Month => CaretRange::new(0, 2),
            Self::Day => CaretRange::new(3, 5),
            Self::Year => CaretRange::new(6, DISPLAY_LEN),
        }
    }

    /// Offsets 0-2 are the month, 3-5 the day, everything after the year.
    pub const fn at_offset(offset: usize) -> Self {
        match offset {
            0..=2 => Self::Month,
            3..=5 => Self::Day,
            _ => Self::Year,
        }
    }

    /// ArrowRight order.
    pub const fn next(self) -> Self {
        match self {
            Self::Month => Self::Day,
            Self::Day => Self::Year,
            Self::Year => Self::Month,
        }
    }

    /// ArrowLeft order, kept as its own table rather than derived from `next`.
    pub const fn prev(self) -> Self {
        match self {
            Self::Month => Self::Year,
            Self::Year => Self::Day,
            Self::Day => Self::Month,
        }
    }
}

/// Half-open character range inside the field text. `start == end` is a bare caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaretRange {
    pub start: usize,
    pub end: usize,
}

impl CaretRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn clamp_to(self, len: usize) -> Self {
        let start = self.start.min(len);
        let end = self.end.min(len).max(start);
        Self { start, end }
    }
}

/// Handle to the rendered text field.
///
/// Hosts implement this over whatever owns the on-screen caret. The state
/// machine never touches the handle while handling a command; it only records
/// a pending range that the host applies once the new text is on screen.
pub trait CaretHandle {
    fn caret(&self) -> CaretRange;
    fn set_caret(&mut self, range: CaretRange);
}

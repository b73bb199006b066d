// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use datefield_app::{CaretHandle, CaretRange};

/// Editable line of text with a selection, indexed by character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    chars: Vec<char>,
    selection: CaretRange,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        let chars = text.chars().collect::<Vec<char>>();
        let end = chars.len();
        Self {
            chars,
            selection: CaretRange::caret(end),
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub const fn selection(&self) -> CaretRange {
        self.selection
    }

    /// Replaces the selection with `ch`.
    pub fn insert(&mut self, ch: char) {
        let range = self.selection.clamp_to(self.len());
        self.chars.splice(range.start..range.end, [ch]);
        self.selection = CaretRange::caret(range.start + 1);
    }

    pub fn backspace(&mut self) -> bool {
        let range = self.selection.clamp_to(self.len());
        if !range.is_empty() {
            return self.delete_range(range);
        }
        if range.start == 0 {
            return false;
        }
        self.delete_range(CaretRange::new(range.start - 1, range.start))
    }

    pub fn delete(&mut self) -> bool {
        let range = self.selection.clamp_to(self.len());
        if !range.is_empty() {
            return self.delete_range(range);
        }
        if range.start >= self.len() {
            return false;
        }
        self.delete_range(CaretRange::new(range.start, range.start + 1))
    }

    pub fn move_to(&mut self, offset: usize) {
        self.selection = CaretRange::caret(offset.min(self.len()));
    }

    pub fn move_home(&mut self) {
        self.move_to(0);
    }

    pub fn move_end(&mut self) {
        self.move_to(self.len());
    }

    /// Swaps in new text, leaving the caret at the end. Returns false when the
    /// text was already current, in which case the selection is untouched.
    pub fn replace(&mut self, text: &str) -> bool {
        if self.chars.iter().copied().eq(text.chars()) {
            return false;
        }
        *self = Self::new(text);
        true
    }

    fn delete_range(&mut self, range: CaretRange) -> bool {
        self.chars.drain(range.start..range.end);
        self.selection = CaretRange::caret(range.start);
        true
    }
}

impl CaretHandle for TextBuffer {
    fn caret(&self) -> CaretRange {
        self.selection
    }

    fn set_caret(&mut self, range: CaretRange) {
        self.selection = range.clamp_to(self.len());
    }
}

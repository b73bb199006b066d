// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, warn};

use crate::{
    CalendarStep, CaretHandle, CaretRange, DateInputError, DisplayParse, Segment, format_display,
    format_iso, format_optional_display, parse_display, parse_iso, roll_segment,
};

/// What the owner hands the control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldProps {
    pub value: Option<String>,
    pub min_date: Option<Date>,
    pub placeholder: String,
    pub clearable: bool,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settled {
    Viewing,
    Editing,
    PopoverOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Not focused.
    Viewing,
    /// Focused with the popover closed.
    Editing,
    /// Focused with the popover calendar showing.
    PopoverOpen,
    /// A commit went out; waiting for the owner to echo the value back.
    Committing { resume: Settled },
}

impl Phase {
    pub const fn settled(self) -> Settled {
        match self {
            Self::Viewing => Settled::Viewing,
            Self::Editing => Settled::Editing,
            Self::PopoverOpen => Settled::PopoverOpen,
            Self::Committing { resume } => resume,
        }
    }

    pub const fn is_focused(self) -> bool {
        !matches!(self.settled(), Settled::Viewing)
    }

    pub const fn popover_open(self) -> bool {
        matches!(self.settled(), Settled::PopoverOpen)
    }
}

impl From<Settled> for Phase {
    fn from(value: Settled) -> Self {
        match value {
            Settled::Viewing => Self::Viewing,
            Settled::Editing => Self::Editing,
            Settled::PopoverOpen => Self::PopoverOpen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// The owner's `value` prop, delivered on every render of the owner.
    SyncValue(Option<String>),
    SetMinDate(Option<Date>),
    Focus,
    /// Focus left the field and its popover, including clicks outside both.
    Blur,
    /// The calendar affordance next to the field.
    OpenPopover,
    Click {
        offset: usize,
    },
    /// Full field text after an edit.
    Input(String),
    Key {
        key: FieldKey,
        caret: usize,
    },
    ShiftCalendar(CalendarStep),
    PickDate(Date),
    PickHighlighted,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InputEvent {
    PhaseChanged(Phase),
    DisplayChanged(String),
    SegmentSelected(Segment),
    CaretScheduled(CaretRange),
    CalendarMoved(Date),
    ErrorChanged(Option<DateInputError>),
    /// ISO `YYYY-MM-DD`, or `None` when cleared.
    Committed(Option<String>),
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInputState {
    label: String,
    placeholder: String,
    clearable: bool,
    min_date: Option<Date>,
    external: Option<String>,
    committed: Option<Date>,
    display: String,
    calendar: Date,
    selected: Option<Segment>,
    error: Option<DateInputError>,
    phase: Phase,
    pending_caret: Option<CaretRange>,
    today: Date,
}

impl DateInputState {
    pub fn new(props: FieldProps, today: Date) -> Self {
        let committed = parse_external(props.value.as_deref());
        Self {
            label: props.label,
            placeholder: props.placeholder,
            clearable: props.clearable,
            min_date: props.min_date,
            external: props.value,
            committed,
            display: format_optional_display(committed),
            calendar: committed.unwrap_or(today),
            selected: None,
            error: None,
            phase: Phase::Viewing,
            pending_caret: None,
            today,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub const fn clearable(&self) -> bool {
        self.clearable
    }

    pub const fn min_date(&self) -> Option<Date> {
        self.min_date
    }

    pub const fn committed(&self) -> Option<Date> {
        self.committed
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub const fn calendar(&self) -> Date {
        self.calendar
    }

    pub const fn selected_segment(&self) -> Option<Segment> {
        self.selected
    }

    pub const fn error(&self) -> Option<DateInputError> {
        self.error
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn today(&self) -> Date {
        self.today
    }

    pub const fn pending_caret(&self) -> Option<CaretRange> {
        self.pending_caret
    }

    /// Segment the keyboard acts on: the one picked by explicit navigation,
    /// otherwise whichever segment holds the caret.
    pub fn active_segment(&self, caret: usize) -> Segment {
        self.selected.unwrap_or_else(|| Segment::at_offset(caret))
    }

    pub fn parse(&self) -> DisplayParse {
        parse_display(&self.display)
    }

    pub fn committable(&self) -> Option<Date> {
        self.parse().committable(self.min_date)
    }

    pub fn is_selectable(&self, date: Date) -> bool {
        self.min_date.is_none_or(|min| date >= min)
    }

    /// Post-render hook: moves the on-screen caret once the field shows the
    /// text the range was computed against.
    pub fn apply_pending_caret<H: CaretHandle + ?Sized>(&mut self, handle: &mut H) -> bool {
        let Some(range) = self.pending_caret.take() else {
            return false;
        };
        handle.set_caret(range.clamp_to(self.display.chars().count()));
        true
    }

    pub fn dispatch(&mut self, command: InputCommand) -> Vec<InputEvent> {
        let mut events = Vec::new();
        match command {
            InputCommand::SyncValue(value) => self.sync_value(value, &mut events),
            InputCommand::SetMinDate(min_date) => {
                self.min_date = min_date;
                self.refresh_error(&mut events);
            }
            InputCommand::Focus => self.focus(&mut events),
            InputCommand::Blur => self.blur(&mut events),
            InputCommand::OpenPopover => {
                if !self.phase.is_focused() {
                    self.focus(&mut events);
                } else if !self.phase.popover_open() {
                    self.open_popover(&mut events);
                }
            }
            InputCommand::Click { offset } => {
                if !self.phase.is_focused() {
                    self.focus(&mut events);
                }
                self.selected = None;
                events.push(InputEvent::SegmentSelected(Segment::at_offset(offset)));
            }
            InputCommand::Input(text) => self.input(text, &mut events),
            InputCommand::Key { key, caret } => self.key(key, caret, &mut events),
            InputCommand::ShiftCalendar(step) => {
                if self.phase.popover_open()
                    && let Some(next) = step.apply(self.calendar)
                {
                    self.move_calendar(next, &mut events);
                }
            }
            InputCommand::PickDate(date) => self.pick(date, &mut events),
            InputCommand::PickHighlighted => {
                if self.phase.popover_open() {
                    self.pick(self.calendar, &mut events);
                }
            }
            InputCommand::Clear => self.clear(&mut events),
        }
        events
    }

    fn sync_value(&mut self, value: Option<String>, events: &mut Vec<InputEvent>) {
        if let Phase::Committing { resume } = self.phase {
            self.set_phase(Phase::from(resume), events);
        }
        if value == self.external {
            return;
        }

        self.committed = parse_external(value.as_deref());
        self.external = value;
        self.selected = None;
        self.set_display(format_optional_display(self.committed), events);
        self.set_error(None, events);
        self.move_calendar(self.committed.unwrap_or(self.today), events);
        debug!(value = ?self.external, "external value synced");
    }

    fn focus(&mut self, events: &mut Vec<InputEvent>) {
        if self.phase.is_focused() {
            return;
        }
        self.open_popover(events);
    }

    fn open_popover(&mut self, events: &mut Vec<InputEvent>) {
        let seed = self.seed_date();
        self.move_calendar(seed, events);
        self.enter(Settled::PopoverOpen, events);
    }

    fn blur(&mut self, events: &mut Vec<InputEvent>) {
        if !self.phase.is_focused() {
            return;
        }
        self.selected = None;
        self.pending_caret = None;
        match self.committable() {
            Some(date) if Some(date) != self.committed => {
                self.commit(Some(date), Settled::Viewing, events);
            }
            Some(date) => {
                self.set_display(format_display(date), events);
                self.enter(Settled::Viewing, events);
            }
            None => {
                self.revert(events);
                self.enter(Settled::Viewing, events);
            }
        }
    }

    fn input(&mut self, text: String, events: &mut Vec<InputEvent>) {
        if !self.phase.is_focused() {
            debug!("input ignored while unfocused");
            return;
        }
        self.selected = None;
        self.set_display(text, events);
        if let DisplayParse::Date(date) = self.parse() {
            self.move_calendar(date, events);
        }
        self.refresh_error(events);
    }

    fn key(&mut self, key: FieldKey, caret: usize, events: &mut Vec<InputEvent>) {
        if !self.phase.is_focused() {
            return;
        }
        let active = self.active_segment(caret);
        match key {
            FieldKey::Left => self.select_segment(active.prev(), events),
            FieldKey::Right => self.select_segment(active.next(), events),
            FieldKey::Up => self.roll(active, 1, events),
            FieldKey::Down => self.roll(active, -1, events),
            FieldKey::Enter => match self.committable() {
                Some(date) if Some(date) != self.committed => {
                    self.commit(Some(date), self.phase.settled(), events);
                }
                Some(date) => self.set_display(format_display(date), events),
                None => debug!(display = %self.display, "enter ignored for invalid date"),
            },
            FieldKey::Escape => {
                self.selected = None;
                self.revert(events);
                self.move_calendar(self.committed.unwrap_or(self.today), events);
                self.enter(Settled::Editing, events);
            }
        }
    }

    fn roll(&mut self, segment: Segment, delta: i32, events: &mut Vec<InputEvent>) {
        let base = self.parse().date().unwrap_or(self.calendar);
        let Some(next) = roll_segment(base, segment, delta) else {
            return;
        };
        self.set_display(format_display(next), events);
        self.move_calendar(next, events);
        self.refresh_error(events);
        self.select_segment(segment, events);
    }

    fn select_segment(&mut self, segment: Segment, events: &mut Vec<InputEvent>) {
        self.selected = Some(segment);
        debug!(segment = segment.label(), "segment selected");
        events.push(InputEvent::SegmentSelected(segment));
        self.schedule_caret(segment.range(), events);
    }

    fn pick(&mut self, date: Date, events: &mut Vec<InputEvent>) {
        if !self.is_selectable(date) {
            debug!(%date, "calendar pick before minimum ignored");
            return;
        }
        self.selected = None;
        self.set_display(format_display(date), events);
        self.set_error(None, events);
        self.move_calendar(date, events);
        if Some(date) == self.committed {
            self.enter(Settled::Editing, events);
        } else {
            self.commit(Some(date), Settled::Editing, events);
        }
    }

    fn clear(&mut self, events: &mut Vec<InputEvent>) {
        if !self.clearable {
            return;
        }
        self.selected = None;
        self.pending_caret = None;
        self.set_error(None, events);
        self.move_calendar(self.today, events);
        self.commit(None, self.phase.settled(), events);
    }

    fn commit(&mut self, value: Option<Date>, resume: Settled, events: &mut Vec<InputEvent>) {
        self.committed = value;
        self.set_display(format_optional_display(value), events);
        self.set_error(None, events);
        self.set_phase(Phase::Committing { resume }, events);
        let iso = value.map(format_iso);
        debug!(value = ?iso, "committed");
        // An owner echoing anything else resyncs the field to its value.
        self.external = iso.clone();
        events.push(InputEvent::Committed(iso));
    }

    fn revert(&mut self, events: &mut Vec<InputEvent>) {
        let restored = format_optional_display(self.committed);
        self.set_error(None, events);
        if self.display != restored {
            debug!(from = %self.display, to = %restored, "reverted pending edit");
            self.set_display(restored, events);
            events.push(InputEvent::Reverted);
        }
    }

    fn seed_date(&self) -> Date {
        self.parse().date().or(self.committed).unwrap_or(self.today)
    }

    fn enter(&mut self, settled: Settled, events: &mut Vec<InputEvent>) {
        let next = match self.phase {
            Phase::Committing { .. } => Phase::Committing { resume: settled },
            _ => Phase::from(settled),
        };
        self.set_phase(next, events);
    }

    fn set_phase(&mut self, phase: Phase, events: &mut Vec<InputEvent>) {
        if self.phase != phase {
            self.phase = phase;
            events.push(InputEvent::PhaseChanged(phase));
        }
    }

    fn set_display(&mut self, text: String, events: &mut Vec<InputEvent>) {
        if self.display != text {
            self.display = text.clone();
            events.push(InputEvent::DisplayChanged(text));
        }
    }

    fn move_calendar(&mut self, date: Date, events: &mut Vec<InputEvent>) {
        if self.calendar != date {
            self.calendar = date;
            events.push(InputEvent::CalendarMoved(date));
        }
    }

    fn refresh_error(&mut self, events: &mut Vec<InputEvent>) {
        let error = self.parse().error(self.min_date);
        self.set_error(error, events);
    }

    fn set_error(&mut self, error: Option<DateInputError>, events: &mut Vec<InputEvent>) {
        if self.error != error {
            self.error = error;
            events.push(InputEvent::ErrorChanged(error));
        }
    }

    fn schedule_caret(&mut self, range: CaretRange, events: &mut Vec<InputEvent>) {
        self.pending_caret = Some(range);
        events.push(InputEvent::CaretScheduled(range));
    }
}

fn parse_external(value: Option<&str>) -> Option<Date> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_iso(raw);
    if parsed.is_none() {
        warn!(value = raw, "ignoring malformed external date value");
    }
    parsed
}

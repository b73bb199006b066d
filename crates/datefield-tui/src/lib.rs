// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod buffer;

pub use buffer::TextBuffer;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use datefield_app::{
    CalendarStep, DateInputState, FieldKey, FieldRuntime, InputCommand, InputEvent, Phase,
    WEEKDAY_HEADER, dispatch_to_owner, is_weekend, month_grid, month_title,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::Date;
use tracing::{debug, warn};

/// Visible width of the text portion of the field.
pub const TEXT_WIDTH: u16 = 16;
const FIELD_WIDTH: u16 = TEXT_WIDTH + 6;
const POPOVER_WIDTH: u16 = 22;
const POPOVER_HEIGHT: u16 = 10;
const CELL_WIDTH: u16 = 3;
const CLEAR_MARK: &str = "x";
const CALENDAR_MARK: &str = "▦";
const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    buffer: TextBuffer,
    grid_focus: bool,
    status: Option<String>,
    status_token: u64,
    area: Rect,
}

/// Screen regions used for both drawing and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub body: Rect,
    pub label: Rect,
    pub field: Rect,
    pub text: Rect,
    pub clear: Rect,
    pub icon: Rect,
    pub error: Rect,
    pub popover: Option<Rect>,
    pub status: Rect,
}

pub fn field_layout(area: Rect, popover_open: bool) -> FieldLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);
    let body = chunks[0];
    let clip = |rect: Rect| rect.intersection(body);

    let left = body.x + 2;
    let top = body.y + 1;
    let field = Rect::new(left, top + 1, FIELD_WIDTH, 3);
    let text = Rect::new(field.x + 1, field.y + 1, TEXT_WIDTH, 1);
    let clear = Rect::new(text.x + TEXT_WIDTH + 1, text.y, 1, 1);
    let icon = Rect::new(clear.x + 2, text.y, 1, 1);
    let error = Rect::new(left, field.bottom(), body.width.saturating_sub(4), 1);
    let popover = popover_open
        .then(|| Rect::new(left, error.bottom(), POPOVER_WIDTH, POPOVER_HEIGHT))
        .map(clip);

    FieldLayout {
        body,
        label: clip(Rect::new(left, top, body.width.saturating_sub(4), 1)),
        field: clip(field),
        text: clip(text),
        clear: clip(clear),
        icon: clip(icon),
        error: clip(error),
        popover,
        status: chunks[1],
    }
}

/// Day under a screen cell of the popover showing `calendar`'s month.
pub fn grid_date_at(popover: Rect, calendar: Date, column: u16, row: u16) -> Option<Date> {
    if !hit(popover, column, row) {
        return None;
    }
    let first_row = popover.y + 3;
    let first_column = popover.x + 1;
    if row < first_row || column < first_column {
        return None;
    }
    let offset = column - first_column;
    if offset % CELL_WIDTH == CELL_WIDTH - 1 {
        return None;
    }
    let weekday = usize::from(offset / CELL_WIDTH);
    let week = usize::from(row - first_row);
    month_grid(calendar).get(week)?.get(weekday).copied().flatten()
}

fn hit(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

pub fn run_app<R: FieldRuntime>(state: &mut DateInputState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        buffer: TextBuffer::new(state.display()),
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(&mut view_data, &internal_rx);

        let mut frame_area = view_data.area;
        if let Err(error) = terminal.draw(|frame| {
            frame_area = frame.area();
            render(frame, state, &view_data);
        }) {
            result = Err(error).context("draw frame");
            break;
        }
        view_data.area = frame_area;
        // The frame now shows the current text, so a scheduled caret can land.
        state.apply_pending_caret(&mut view_data.buffer);

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen)
        .context("leave alternate screen")?;
    result
}

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status = None;
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Runs one command through the control and its owner, then brings the
/// buffer and focus flags in line with the new state.
fn apply_command<R: FieldRuntime>(
    state: &mut DateInputState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: InputCommand,
) {
    match dispatch_to_owner(state, runtime, command) {
        Ok(events) => {
            if let Some(message) = status_for_events(&events) {
                emit_status(view_data, internal_tx, message);
            }
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "owner rejected commit");
            emit_status(view_data, internal_tx, format!("commit failed: {error:#}"));
        }
    }

    view_data.buffer.replace(state.display());
    if !state.phase().popover_open() {
        view_data.grid_focus = false;
    }
}

fn status_for_events(events: &[InputEvent]) -> Option<String> {
    events.iter().rev().find_map(|event| match event {
        InputEvent::Committed(Some(value)) => Some(format!("saved {value}")),
        InputEvent::Committed(None) => Some("cleared".to_owned()),
        InputEvent::Reverted => Some("edit reverted".to_owned()),
        _ => None,
    })
}

fn handle_key_event<R: FieldRuntime>(
    state: &mut DateInputState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        if state.phase().is_focused() {
            apply_command(state, runtime, view_data, internal_tx, InputCommand::Blur);
        }
        return true;
    }

    if !state.phase().is_focused() {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Enter | KeyCode::Char(' ') => {
                apply_command(state, runtime, view_data, internal_tx, InputCommand::Focus);
            }
            _ => {}
        }
        return false;
    }

    if view_data.grid_focus {
        handle_grid_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::Char('o'), KeyModifiers::CONTROL) => Some(InputCommand::OpenPopover),
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
            if !state.clearable() {
                emit_status(view_data, internal_tx, "field is not clearable");
            }
            Some(InputCommand::Clear)
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.buffer.insert(ch);
            Some(InputCommand::Input(view_data.buffer.text()))
        }
        (KeyCode::Backspace, _) => view_data
            .buffer
            .backspace()
            .then(|| InputCommand::Input(view_data.buffer.text())),
        (KeyCode::Delete, _) => view_data
            .buffer
            .delete()
            .then(|| InputCommand::Input(view_data.buffer.text())),
        (KeyCode::Home, _) => {
            view_data.buffer.move_home();
            None
        }
        (KeyCode::End, _) => {
            view_data.buffer.move_end();
            None
        }
        (KeyCode::Left, _) => Some(field_key(view_data, FieldKey::Left)),
        (KeyCode::Right, _) => Some(field_key(view_data, FieldKey::Right)),
        (KeyCode::Up, _) => Some(field_key(view_data, FieldKey::Up)),
        (KeyCode::Down, _) => Some(field_key(view_data, FieldKey::Down)),
        (KeyCode::Enter, _) => Some(field_key(view_data, FieldKey::Enter)),
        (KeyCode::Esc, _) => Some(field_key(view_data, FieldKey::Escape)),
        (KeyCode::Tab, _) => {
            apply_command(
                state,
                runtime,
                view_data,
                internal_tx,
                InputCommand::OpenPopover,
            );
            view_data.grid_focus = state.phase().popover_open();
            None
        }
        (KeyCode::BackTab, _) => Some(InputCommand::Blur),
        _ => None,
    };

    if let Some(command) = command {
        apply_command(state, runtime, view_data, internal_tx, command);
    }
    false
}

fn field_key(view_data: &ViewData, key: FieldKey) -> InputCommand {
    InputCommand::Key {
        key,
        caret: view_data.buffer.selection().start,
    }
}

fn handle_grid_key<R: FieldRuntime>(
    state: &mut DateInputState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            view_data.grid_focus = false;
            return;
        }
        KeyCode::Esc => field_key(view_data, FieldKey::Escape),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let highlighted = state.calendar();
            if !state.is_selectable(highlighted) {
                emit_status(view_data, internal_tx, "day is before the minimum date");
                return;
            }
            InputCommand::PickHighlighted
        }
        KeyCode::Char('h') | KeyCode::Left => InputCommand::ShiftCalendar(CalendarStep::Days(-1)),
        KeyCode::Char('l') | KeyCode::Right => InputCommand::ShiftCalendar(CalendarStep::Days(1)),
        KeyCode::Char('j') | KeyCode::Down => InputCommand::ShiftCalendar(CalendarStep::Days(7)),
        KeyCode::Char('k') | KeyCode::Up => InputCommand::ShiftCalendar(CalendarStep::Days(-7)),
        KeyCode::Char('H') => InputCommand::ShiftCalendar(CalendarStep::Months(-1)),
        KeyCode::Char('L') => InputCommand::ShiftCalendar(CalendarStep::Months(1)),
        KeyCode::Char('[') => InputCommand::ShiftCalendar(CalendarStep::Years(-1)),
        KeyCode::Char(']') => InputCommand::ShiftCalendar(CalendarStep::Years(1)),
        _ => return,
    };
    apply_command(state, runtime, view_data, internal_tx, command);
}

fn handle_mouse_event<R: FieldRuntime>(
    state: &mut DateInputState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let layout = field_layout(view_data.area, state.phase().popover_open());
    let (column, row) = (mouse.column, mouse.row);

    let command = if hit(layout.text, column, row) {
        let offset = usize::from(column - layout.text.x).min(view_data.buffer.len());
        view_data.buffer.move_to(offset);
        view_data.grid_focus = false;
        InputCommand::Click { offset }
    } else if state.clearable() && hit(layout.clear, column, row) {
        InputCommand::Clear
    } else if hit(layout.icon, column, row) {
        InputCommand::OpenPopover
    } else if let Some(popover) = layout.popover
        && hit(popover, column, row)
    {
        let Some(date) = grid_date_at(popover, state.calendar(), column, row) else {
            return;
        };
        if !state.is_selectable(date) {
            debug!(%date, "click on disabled day");
            return;
        }
        InputCommand::PickDate(date)
    } else if hit(layout.field, column, row) {
        return;
    } else if state.phase().is_focused() {
        InputCommand::Blur
    } else {
        return;
    };
    apply_command(state, runtime, view_data, internal_tx, command);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &DateInputState, view_data: &ViewData) {
    let focused = state.phase().is_focused();
    let layout = field_layout(frame.area(), state.phase().popover_open());

    frame.render_widget(
        Block::default().title("datefield").borders(Borders::ALL),
        layout.body,
    );

    let label = Paragraph::new(state.label().to_owned())
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(label, layout.label);

    let border_color = if state.error().is_some() {
        Color::Red
    } else if focused && !view_data.grid_focus {
        Color::Cyan
    } else {
        Color::White
    };
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(border_color)),
        layout.field,
    );
    frame.render_widget(
        Paragraph::new(field_text_line(state, view_data)),
        layout.text,
    );
    if state.clearable() {
        frame.render_widget(
            Paragraph::new(CLEAR_MARK).style(Style::default().fg(Color::Gray)),
            layout.clear,
        );
    }
    frame.render_widget(
        Paragraph::new(CALENDAR_MARK).style(Style::default().fg(Color::Cyan)),
        layout.icon,
    );

    if let Some(error) = state.error() {
        frame.render_widget(
            Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red)),
            layout.error,
        );
    }

    if let Some(popover) = layout.popover {
        frame.render_widget(Clear, popover);
        let picker = Paragraph::new(render_popover_lines(state, view_data.grid_focus)).block(
            Block::default().borders(Borders::ALL).style(Style::default().fg(
                if view_data.grid_focus {
                    Color::Cyan
                } else {
                    Color::White
                },
            )),
        );
        frame.render_widget(picker, popover);
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout.status);

    if focused && !view_data.grid_focus {
        let caret = u16::try_from(view_data.buffer.selection().end)
            .unwrap_or(TEXT_WIDTH)
            .min(layout.text.width.saturating_sub(1));
        frame.set_cursor_position((layout.text.x + caret, layout.text.y));
    }
}

fn field_text_line(state: &DateInputState, view_data: &ViewData) -> Line<'static> {
    let display = state.display();
    if display.is_empty() {
        return Line::from(Span::styled(
            state.placeholder().to_owned(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let selection = view_data.buffer.selection();
    if !state.phase().is_focused() || view_data.grid_focus || selection.is_empty() {
        return Line::from(display.to_owned());
    }

    let chars = display.chars().collect::<Vec<char>>();
    let range = selection.clamp_to(chars.len());
    Line::from(vec![
        Span::raw(chars[..range.start].iter().collect::<String>()),
        Span::styled(
            chars[range.start..range.end].iter().collect::<String>(),
            Style::default().add_modifier(Modifier::REVERSED),
        ),
        Span::raw(chars[range.end..].iter().collect::<String>()),
    ])
}

fn render_popover_lines(state: &DateInputState, grid_focus: bool) -> Vec<Line<'static>> {
    let calendar = state.calendar();
    let mut lines = vec![
        Line::from(month_title(calendar)).alignment(Alignment::Center),
        Line::from(WEEKDAY_HEADER.join(" ")).style(Style::default().fg(Color::Gray)),
    ];

    for week in month_grid(calendar) {
        let mut spans = Vec::with_capacity(week.len() * 2);
        for (index, cell) in week.iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" "));
            }
            match cell {
                Some(day) => spans.push(Span::styled(
                    format!("{:>2}", day.day()),
                    day_style(state, *day, grid_focus),
                )),
                None => spans.push(Span::raw("  ")),
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn day_style(state: &DateInputState, day: Date, grid_focus: bool) -> Style {
    let mut style = Style::default();
    if !state.is_selectable(day) {
        style = style.fg(Color::DarkGray).add_modifier(Modifier::DIM);
    } else if Some(day) == state.committed() {
        style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
    } else if is_weekend(day.weekday()) {
        style = style.fg(Color::Gray);
    }
    if day == state.today() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if day == state.calendar() {
        style = style.add_modifier(Modifier::REVERSED);
        if grid_focus {
            style = style.fg(Color::Cyan);
        }
    }
    style
}

fn status_text(state: &DateInputState, view_data: &ViewData) -> String {
    if let Some(status) = &view_data.status {
        return status.clone();
    }
    if view_data.grid_focus {
        return "h/l day | j/k week | H/L month | [/] year | enter pick | tab back | esc revert"
            .to_owned();
    }
    match state.phase() {
        Phase::Viewing => "tab edit | q quit".to_owned(),
        Phase::Committing { .. } => "saving".to_owned(),
        _ => {
            let clear = if state.clearable() { " | ^u clear" } else { "" };
            format!(
                "←/→ segment | ↑/↓ adjust | enter save | esc revert | tab calendar{clear} | shift-tab leave"
            )
        }
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::info;

use crate::{DateInputState, InputCommand, InputEvent};

/// The owning UI tree: receives commits and holds the `value` prop.
pub trait FieldRuntime {
    fn commit(&mut self, value: Option<&str>) -> Result<()>;
    fn value(&self) -> Option<String>;
}

/// Dispatches `command`, forwards any commit to the owner, and feeds the
/// owner's resulting value back in as the new prop. Returns every event
/// produced along the way.
///
/// A failing owner still resyncs the field to whatever value it holds
/// before the error is returned.
pub fn dispatch_to_owner<R: FieldRuntime + ?Sized>(
    state: &mut DateInputState,
    runtime: &mut R,
    command: InputCommand,
) -> Result<Vec<InputEvent>> {
    let mut events = state.dispatch(command);
    let committed = events
        .iter()
        .filter_map(|event| match event {
            InputEvent::Committed(value) => Some(value.clone()),
            _ => None,
        })
        .collect::<Vec<Option<String>>>();

    for value in committed {
        if let Err(error) = runtime.commit(value.as_deref()) {
            state.dispatch(InputCommand::SyncValue(runtime.value()));
            return Err(error);
        }
        info!(value = ?value, "owner accepted commit");
        events.extend(state.dispatch(InputCommand::SyncValue(runtime.value())));
    }
    Ok(events)
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod calendar;
pub mod date;
pub mod owner;
pub mod segment;
pub mod state;

pub use calendar::*;
pub use date::*;
pub use owner::*;
pub use segment::*;
pub use state::*;

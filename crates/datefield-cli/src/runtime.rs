// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use datefield_app::{FieldRuntime, parse_iso};
use serde::Serialize;
use std::io::Write;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

/// One accepted commit, in the order the field produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub sequence: u64,
    pub previous: Option<String>,
    pub value: Option<String>,
    pub at: String,
}

/// Owner of the field's value for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct OwnerRuntime {
    value: Option<String>,
    transcript: Vec<CommitRecord>,
}

impl OwnerRuntime {
    pub fn new(value: Option<String>) -> Self {
        Self {
            value,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[CommitRecord] {
        &self.transcript
    }

    /// Final value as plain text, or the transcript as JSON lines.
    pub fn write_summary<W: Write>(&self, out: &mut W, json: bool) -> Result<()> {
        if json {
            for record in &self.transcript {
                let line = serde_json::to_string(record).context("encode commit record")?;
                writeln!(out, "{line}").context("write commit record")?;
            }
            return Ok(());
        }
        writeln!(out, "{}", self.value.as_deref().unwrap_or_default()).context("write value")
    }
}

impl FieldRuntime for OwnerRuntime {
    fn commit(&mut self, value: Option<&str>) -> Result<()> {
        if let Some(raw) = value
            && parse_iso(raw).is_none()
        {
            return Err(anyhow!("refusing malformed date {raw:?} from field"));
        }

        let at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("format commit timestamp")?;
        let record = CommitRecord {
            sequence: self.transcript.len() as u64 + 1,
            previous: self.value.clone(),
            value: value.map(str::to_owned),
            at,
        };
        info!(sequence = record.sequence, value = ?record.value, "value committed");
        self.value = record.value.clone();
        self.transcript.push(record);
        Ok(())
    }

    fn value(&self) -> Option<String> {
        self.value.clone()
    }
}

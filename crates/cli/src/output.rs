// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering of rule sets as tables or JSON.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tq_core::{PreviewKind, RulesView};

use crate::color;
use crate::table::{Column, Table};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Jsonl,
    None,
}

impl OutputFormat {
    /// Machine-parseable formats, which cannot be mixed with prompts.
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Jsonl)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Print both rule tables, or the view as JSON.
pub fn print_rules(
    out: &mut impl Write,
    view: &RulesView,
    format: OutputFormat,
    colorize: bool,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "{}", color::header("Assignment Rules:", colorize))?;
            write_table(out, assignment_table(view, colorize), colorize)?;
            writeln!(out)?;
            writeln!(out, "{}", color::header("Redirection Rules:", colorize))?;
            write_table(out, redirect_table(view, colorize), colorize)?;
        }
        OutputFormat::Json | OutputFormat::Jsonl | OutputFormat::None => {
            print_structured(out, view, format)?;
        }
    }
    Ok(())
}

/// Print the half of the rule set an operation is about to change.
pub fn print_preview(
    out: &mut impl Write,
    view: &RulesView,
    kind: PreviewKind,
    colorize: bool,
) -> Result<(), RenderError> {
    match kind {
        PreviewKind::Assignment => {
            writeln!(
                out,
                "{}",
                color::header("Current Assignment Rules:", colorize)
            )?;
            write_table(out, assignment_table(view, colorize), colorize)?;
        }
        PreviewKind::Redirect => {
            writeln!(out, "{}", color::header("Current Redirect Rules:", colorize))?;
            write_table(out, redirect_table(view, colorize), colorize)?;
        }
    }
    Ok(())
}

/// Serialize `value` per the structured format; text falls back to pretty JSON.
pub fn print_structured<T: Serialize>(
    out: &mut impl Write,
    value: &T,
    format: OutputFormat,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Text | OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        }
        OutputFormat::Jsonl => {
            writeln!(out, "{}", serde_json::to_string(value)?)?;
        }
        OutputFormat::None => {}
    }
    Ok(())
}

pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn assignment_table(view: &RulesView, colorize: bool) -> Table {
    let mut table = Table::new(
        vec![
            Column::right("POSITION"),
            Column::left("TARGET BUILD ID"),
            Column::right("RAMP %"),
            Column::muted("CREATE TIME"),
        ],
        colorize,
    );
    for row in &view.assignment_rules {
        table.row(vec![
            row.position.to_string(),
            row.target_build_id.clone(),
            row.ramp_percentage.to_string(),
            format_time(&row.create_time),
        ]);
    }
    table
}

fn redirect_table(view: &RulesView, colorize: bool) -> Table {
    let mut table = Table::new(
        vec![
            Column::left("SOURCE BUILD ID"),
            Column::left("TARGET BUILD ID"),
            Column::muted("CREATE TIME"),
        ],
        colorize,
    );
    for row in &view.redirect_rules {
        table.row(vec![
            row.source_build_id.clone(),
            row.target_build_id.clone(),
            format_time(&row.create_time),
        ]);
    }
    table
}

fn write_table(out: &mut impl Write, table: Table, colorize: bool) -> Result<(), RenderError> {
    if table.is_empty() {
        writeln!(out, "{}", color::muted("(none)", colorize))?;
    } else {
        table.render(out)?;
    }
    Ok(())
}

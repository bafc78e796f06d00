// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tq poller` command handlers for the local rules store

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use tq_storage::{LocalRulesStore, PollerRecord};

use crate::output::{self, format_time, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct PollerArgs {
    #[command(subcommand)]
    pub command: PollerCommand,
}

#[derive(Subcommand)]
pub enum PollerCommand {
    /// Record a worker poll for a Build ID
    Record {
        /// Task queue name
        #[arg(long = "task-queue", short = 't')]
        task_queue: String,
        /// Build ID the worker polls with
        #[arg(long = "build-id")]
        build_id: String,
    },
    /// List pollers seen on a task queue
    List {
        /// Task queue name
        #[arg(long = "task-queue", short = 't')]
        task_queue: String,
    },
}

pub async fn handle(
    command: PollerCommand,
    store: &LocalRulesStore,
    out: &mut impl Write,
    format: OutputFormat,
    colorize: bool,
) -> Result<()> {
    match command {
        PollerCommand::Record {
            task_queue,
            build_id,
        } => {
            store.record_poller(&task_queue, &build_id).await?;
            match format {
                OutputFormat::Text => {
                    writeln!(out, "Recorded poller {} on {}", build_id, task_queue)?
                }
                OutputFormat::Json | OutputFormat::Jsonl => {
                    let obj = serde_json::json!({
                        "taskQueue": task_queue,
                        "buildID": build_id,
                    });
                    output::print_structured(out, &obj, format)?;
                }
                OutputFormat::None => {}
            }
        }
        PollerCommand::List { task_queue } => {
            let pollers = store.pollers(&task_queue).await?;
            match format {
                OutputFormat::Text => print_pollers(out, &pollers, colorize)?,
                _ => output::print_structured(out, &pollers, format)?,
            }
        }
    }
    Ok(())
}

fn print_pollers(out: &mut impl Write, pollers: &[PollerRecord], colorize: bool) -> Result<()> {
    if pollers.is_empty() {
        writeln!(out, "{}", crate::color::muted("No pollers seen", colorize))?;
        return Ok(());
    }
    let mut table = Table::new(
        vec![
            Column::left("BUILD ID"),
            Column::left("LAST SEEN"),
            Column::muted("RECENT"),
        ],
        colorize,
    );
    for p in pollers {
        table.row(vec![
            p.build_id.clone(),
            format_time(&p.last_seen),
            if p.recent { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.render(out)?;
    Ok(())
}

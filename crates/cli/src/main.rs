// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tq - task queue Build ID versioning rules

mod color;
mod commands;
mod engine;
mod env;
mod error;
mod exit_error;
mod guard;
mod logging;
mod output;
mod table;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use commands::{poller, versioning};
use tq_core::TracedRulesClient;
use tq_storage::LocalRulesStore;

use crate::engine::Presenter;
use crate::exit_error::{ExitError, EXIT_INTERRUPTED, EXIT_TIMED_OUT};
use crate::guard::StdinConfirmer;
use crate::output::OutputFormat;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

#[derive(Parser)]
#[command(
    name = "tq",
    version,
    about = "Manage Build ID versioning rules of task queues",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// Directory holding rule state (default: $TQ_STATE_DIR or ~/.local/state/tq)
    #[arg(long = "state-dir", global = true)]
    state_dir: Option<PathBuf>,

    /// Abort the command after this many seconds
    #[arg(long = "command-timeout", value_name = "SECS", global = true)]
    command_timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build ID assignment and redirect rules
    Versioning(versioning::VersioningArgs),
    /// Worker pollers seen by the local store
    Poller(poller::PollerArgs),
}

fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    let timeout = cli
        .command_timeout
        .map(Duration::from_secs)
        .or_else(env::command_timeout_ms);

    let result = tokio::select! {
        r = run(cli) => r,
        Ok(()) = tokio::signal::ctrl_c() => {
            Err(ExitError::new(EXIT_INTERRUPTED, "interrupted").into())
        }
        _ = expire(timeout) => Err(ExitError::new(
            EXIT_TIMED_OUT,
            format!("command timed out after {:?}", timeout.unwrap_or_default()),
        )
        .into()),
    };

    if let Err(e) = result {
        let code = e.downcast_ref::<ExitError>().map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Resolves after `timeout`, or never when unset.
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, the
/// "Caused by" chain is skipped. Otherwise the full chain is rendered.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.output;
    let colorize = color::should_colorize();

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            cli_command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let state_dir = cli.state_dir.or_else(env::state_dir).ok_or_else(|| {
        anyhow!("cannot determine state directory; set TQ_STATE_DIR or pass --state-dir")
    })?;
    let store = LocalRulesStore::open(&state_dir)?;

    // Unlocked: the stdin confirmer writes its prompt from another thread.
    let mut stdout = std::io::stdout();
    match command {
        Commands::Versioning(args) => {
            let client = TracedRulesClient::new(store);
            let presenter = Presenter {
                out: &mut stdout,
                format,
                colorize,
            };
            versioning::handle(args.command, &client, &StdinConfirmer, presenter).await?;
        }
        Commands::Poller(args) => {
            poller::handle(args.command, &store, &mut stdout, format, colorize).await?;
        }
    }
    stdout.flush()?;
    Ok(())
}

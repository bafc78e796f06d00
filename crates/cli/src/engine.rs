// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one rule mutation: acquire a token, submit, render.
//!
//! There is no retry loop. A stale token or rejected update ends the
//! invocation and the operator re-runs the command.

use std::fmt;
use std::io::Write;

use tq_core::{Operation, RulesClient, RulesView};

use crate::error::CommandError;
use crate::guard::{Confirmer, ConflictTokenGuard};
use crate::output::{self, OutputFormat};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

pub const SUCCESS_MESSAGE: &str = "Successfully updated task queue build ID rules";

/// Progress of a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    TokenAcquired,
    PreviewConfirmed,
    Submitted,
    Applied,
    Rejected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::TokenAcquired => "token_acquired",
            Phase::PreviewConfirmed => "preview_confirmed",
            Phase::Submitted => "submitted",
            Phase::Applied => "applied",
            Phase::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub task_queue: String,
    pub op: Operation,
    /// Skip preview and prompt.
    pub yes: bool,
}

/// Output settings shared by every command.
pub struct Presenter<'a, W> {
    pub out: &'a mut W,
    pub format: OutputFormat,
    pub colorize: bool,
}

fn transition(task_queue: &str, from: Phase, to: Phase) -> Phase {
    tracing::debug!(task_queue, %from, %to, "mutation phase");
    to
}

/// Submit `req.op` and print the resulting rule set.
pub async fn run_mutation<C, F, W>(
    client: &C,
    confirmer: &F,
    presenter: Presenter<'_, W>,
    req: MutationRequest,
) -> Result<RulesView, CommandError>
where
    C: RulesClient + ?Sized,
    F: Confirmer + ?Sized,
    W: Write + Send,
{
    let Presenter {
        out,
        format,
        colorize,
    } = presenter;
    let task_queue = req.task_queue.as_str();
    let mut phase = Phase::Idle;

    if let Err(e) = req.op.validate() {
        transition(task_queue, phase, Phase::Rejected);
        return Err(CommandError::Rules(e));
    }

    let guard = ConflictTokenGuard {
        client,
        confirmer,
        format,
        colorize,
    };
    let safe_mode = !req.yes;
    let acquired = guard
        .acquire(
            task_queue,
            safe_mode,
            req.op.preview_kind(),
            req.op.description(),
            &mut *out,
        )
        .await;
    let token = match acquired {
        Ok(token) => token,
        Err(e) => {
            transition(task_queue, phase, Phase::Rejected);
            return Err(e);
        }
    };
    phase = transition(task_queue, phase, Phase::TokenAcquired);
    if safe_mode {
        phase = transition(task_queue, phase, Phase::PreviewConfirmed);
    }

    phase = transition(task_queue, phase, Phase::Submitted);
    let set = match client.update_rules(task_queue, &token, req.op).await {
        Ok(set) => set,
        Err(e) => {
            transition(task_queue, phase, Phase::Rejected);
            return Err(CommandError::from_rules("update", e));
        }
    };
    transition(task_queue, phase, Phase::Applied);

    let view = RulesView::from(&set);
    output::print_rules(&mut *out, &view, format, colorize)?;
    if format == OutputFormat::Text {
        writeln!(out, "{}", SUCCESS_MESSAGE)?;
    }
    Ok(view)
}

/// Print the current rule set without mutating it.
pub async fn show_rules<C, W>(
    client: &C,
    presenter: Presenter<'_, W>,
    task_queue: &str,
) -> Result<RulesView, CommandError>
where
    C: RulesClient + ?Sized,
    W: Write + Send,
{
    let set = client
        .get_rules(task_queue)
        .await
        .map_err(|e| CommandError::from_rules("get", e))?;
    let view = RulesView::from(&set);
    output::print_rules(presenter.out, &view, presenter.format, presenter.colorize)?;
    Ok(view)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tq versioning` command handlers

use std::io::Write;

use clap::{Args, Subcommand};
use tq_core::{AssignmentRule, Operation, RedirectRule, RulesClient};

use crate::engine::{self, MutationRequest, Presenter};
use crate::error::CommandError;
use crate::guard::Confirmer;

#[cfg(test)]
#[path = "versioning_tests.rs"]
mod tests;

#[derive(Args)]
pub struct VersioningArgs {
    #[command(subcommand)]
    pub command: VersioningCommand,
}

/// Flags shared by every mutating subcommand.
#[derive(Args, Debug, Clone)]
pub struct MutationFlags {
    /// Task queue name
    #[arg(long = "task-queue", short = 't')]
    pub task_queue: String,
    /// Skip the preview and confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum VersioningCommand {
    /// Show the assignment and redirect rules of a task queue
    GetRules {
        /// Task queue name
        #[arg(long = "task-queue", short = 't')]
        task_queue: String,
    },
    /// Insert an assignment rule at a position
    InsertAssignmentRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Target Build ID
        #[arg(long = "build-id")]
        build_id: String,
        /// Position to insert at; positions past the end append
        #[arg(long = "rule-index", short = 'i', default_value_t = 0)]
        rule_index: usize,
        /// Percentage of new workflows to route to the target
        #[arg(long, default_value_t = 100.0)]
        percentage: f32,
    },
    /// Replace the assignment rule at a position
    ReplaceAssignmentRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Target Build ID
        #[arg(long = "build-id")]
        build_id: String,
        /// Position of the rule to replace
        #[arg(long = "rule-index", short = 'i')]
        rule_index: usize,
        /// Percentage of new workflows to route to the target
        #[arg(long, default_value_t = 100.0)]
        percentage: f32,
        /// Allow leaving the queue without an unconditional rule
        #[arg(long)]
        force: bool,
    },
    /// Delete the assignment rule at a position
    DeleteAssignmentRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Position of the rule to delete
        #[arg(long = "rule-index", short = 'i')]
        rule_index: usize,
        /// Allow leaving the queue without an unconditional rule
        #[arg(long)]
        force: bool,
    },
    /// Make a Build ID the unconditional default
    CommitBuildId {
        #[command(flatten)]
        flags: MutationFlags,
        /// Build ID to commit
        #[arg(long = "build-id")]
        build_id: String,
        /// Commit even when no recent pollers were seen for the Build ID
        #[arg(long)]
        force: bool,
    },
    /// Add a redirect rule
    AddRedirectRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Build ID to redirect from
        #[arg(long = "source-build-id")]
        source_build_id: String,
        /// Build ID to redirect to
        #[arg(long = "target-build-id")]
        target_build_id: String,
    },
    /// Change the target of an existing redirect rule
    ReplaceRedirectRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Build ID the rule redirects from
        #[arg(long = "source-build-id")]
        source_build_id: String,
        /// New Build ID to redirect to
        #[arg(long = "target-build-id")]
        target_build_id: String,
    },
    /// Delete a redirect rule
    DeleteRedirectRule {
        #[command(flatten)]
        flags: MutationFlags,
        /// Build ID the rule redirects from
        #[arg(long = "source-build-id")]
        source_build_id: String,
    },
}

impl VersioningCommand {
    /// The mutation this command submits, or `None` for read-only commands.
    pub fn into_request(self) -> Option<MutationRequest> {
        let (flags, op) = match self {
            VersioningCommand::GetRules { .. } => return None,
            VersioningCommand::InsertAssignmentRule {
                flags,
                build_id,
                rule_index,
                percentage,
            } => (
                flags,
                Operation::InsertAssignmentRule {
                    rule_index,
                    rule: AssignmentRule::with_percentage(build_id, percentage),
                },
            ),
            VersioningCommand::ReplaceAssignmentRule {
                flags,
                build_id,
                rule_index,
                percentage,
                force,
            } => (
                flags,
                Operation::ReplaceAssignmentRule {
                    rule_index,
                    rule: AssignmentRule::with_percentage(build_id, percentage),
                    force,
                },
            ),
            VersioningCommand::DeleteAssignmentRule {
                flags,
                rule_index,
                force,
            } => (flags, Operation::DeleteAssignmentRule { rule_index, force }),
            VersioningCommand::CommitBuildId {
                flags,
                build_id,
                force,
            } => (
                flags,
                Operation::CommitBuildId {
                    target_build_id: build_id,
                    force,
                },
            ),
            VersioningCommand::AddRedirectRule {
                flags,
                source_build_id,
                target_build_id,
            } => (
                flags,
                Operation::AddRedirectRule {
                    rule: RedirectRule::new(source_build_id, target_build_id),
                },
            ),
            VersioningCommand::ReplaceRedirectRule {
                flags,
                source_build_id,
                target_build_id,
            } => (
                flags,
                Operation::ReplaceRedirectRule {
                    rule: RedirectRule::new(source_build_id, target_build_id),
                },
            ),
            VersioningCommand::DeleteRedirectRule {
                flags,
                source_build_id,
            } => (flags, Operation::DeleteRedirectRule { source_build_id }),
        };
        Some(MutationRequest {
            task_queue: flags.task_queue,
            op,
            yes: flags.yes,
        })
    }
}

pub async fn handle<C, F, W>(
    command: VersioningCommand,
    client: &C,
    confirmer: &F,
    presenter: Presenter<'_, W>,
) -> Result<(), CommandError>
where
    C: RulesClient + ?Sized,
    F: Confirmer + ?Sized,
    W: Write + Send,
{
    if let VersioningCommand::GetRules { task_queue } = &command {
        engine::show_rules(client, presenter, task_queue).await?;
        return Ok(());
    }
    if let Some(req) = command.into_request() {
        engine::run_mutation(client, confirmer, presenter, req).await?;
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule mutation operations.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;
use crate::rules::{AssignmentRule, Ramp, RedirectRule};

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;

/// Longest Build ID the service accepts.
pub const MAX_BUILD_ID_LEN: usize = 255;

/// Which half of the rule set an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Assignment,
    Redirect,
}

/// A single mutation submitted with a conflict token.
///
/// The service applies each operation atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert at `min(rule_index, len)`; later rules shift down.
    InsertAssignmentRule {
        rule_index: usize,
        rule: AssignmentRule,
    },
    /// Overwrite the rule at `rule_index` in place.
    ReplaceAssignmentRule {
        rule_index: usize,
        rule: AssignmentRule,
        force: bool,
    },
    /// Remove the rule at `rule_index`; later rules shift up.
    DeleteAssignmentRule { rule_index: usize, force: bool },
    /// Make `target_build_id` the unconditional default, dropping its older
    /// rules and every other unconditional rule.
    CommitBuildId { target_build_id: String, force: bool },
    AddRedirectRule { rule: RedirectRule },
    ReplaceRedirectRule { rule: RedirectRule },
    DeleteRedirectRule { source_build_id: String },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertAssignmentRule { .. } => "insert_assignment_rule",
            Operation::ReplaceAssignmentRule { .. } => "replace_assignment_rule",
            Operation::DeleteAssignmentRule { .. } => "delete_assignment_rule",
            Operation::CommitBuildId { .. } => "commit_build_id",
            Operation::AddRedirectRule { .. } => "add_redirect_rule",
            Operation::ReplaceRedirectRule { .. } => "replace_redirect_rule",
            Operation::DeleteRedirectRule { .. } => "delete_redirect_rule",
        }
    }

    /// Phrase used in confirmation prompts, e.g. "inserting an assignment rule".
    pub fn description(&self) -> &'static str {
        match self {
            Operation::InsertAssignmentRule { .. } => "inserting an assignment rule",
            Operation::ReplaceAssignmentRule { .. } => "replacing an assignment rule",
            Operation::DeleteAssignmentRule { .. } => "deleting an assignment rule",
            Operation::CommitBuildId { .. } => "committing a Build ID",
            Operation::AddRedirectRule { .. } => "adding a redirect rule",
            Operation::ReplaceRedirectRule { .. } => "replacing a redirect rule",
            Operation::DeleteRedirectRule { .. } => "deleting a redirect rule",
        }
    }

    pub fn preview_kind(&self) -> PreviewKind {
        match self {
            Operation::InsertAssignmentRule { .. }
            | Operation::ReplaceAssignmentRule { .. }
            | Operation::DeleteAssignmentRule { .. }
            | Operation::CommitBuildId { .. } => PreviewKind::Assignment,
            Operation::AddRedirectRule { .. }
            | Operation::ReplaceRedirectRule { .. }
            | Operation::DeleteRedirectRule { .. } => PreviewKind::Redirect,
        }
    }

    /// Argument checks that need no knowledge of the current rule set.
    pub fn validate(&self) -> Result<(), RulesError> {
        match self {
            Operation::InsertAssignmentRule { rule, .. }
            | Operation::ReplaceAssignmentRule { rule, .. } => validate_assignment_rule(rule),
            Operation::DeleteAssignmentRule { .. } => Ok(()),
            Operation::CommitBuildId {
                target_build_id, ..
            } => validate_build_id("target", target_build_id),
            Operation::AddRedirectRule { rule } | Operation::ReplaceRedirectRule { rule } => {
                validate_build_id("source", &rule.source_build_id)?;
                validate_build_id("target", &rule.target_build_id)?;
                if rule.source_build_id == rule.target_build_id {
                    return Err(RulesError::validation(format!(
                        "redirect rule source and target must differ, got '{}' for both",
                        rule.source_build_id
                    )));
                }
                Ok(())
            }
            Operation::DeleteRedirectRule { source_build_id } => {
                validate_build_id("source", source_build_id)
            }
        }
    }
}

fn validate_assignment_rule(rule: &AssignmentRule) -> Result<(), RulesError> {
    validate_build_id("target", &rule.target_build_id)?;
    if let Some(Ramp::Percentage(p)) = rule.ramp {
        validate_percentage(p)?;
    }
    Ok(())
}

/// Ramp percentages must be finite and within 0–100 inclusive.
pub fn validate_percentage(percentage: f32) -> Result<(), RulesError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(RulesError::validation(format!(
            "ramp percentage must be between 0 and 100, got {}",
            percentage
        )));
    }
    Ok(())
}

fn validate_build_id(role: &str, build_id: &str) -> Result<(), RulesError> {
    if build_id.trim().is_empty() {
        return Err(RulesError::validation(format!(
            "{} build ID must not be empty",
            role
        )));
    }
    if build_id.chars().count() > MAX_BUILD_ID_LEN {
        return Err(RulesError::validation(format!(
            "{} build ID exceeds {} characters",
            role, MAX_BUILD_ID_LEN
        )));
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-side application of rule operations.
//!
//! Every rules service (the local store, the test fake) funnels updates
//! through [`apply`] so that they enforce identical invariants. The input is
//! never modified: on error the caller's rules are untouched, which keeps
//! each operation all-or-nothing.

use chrono::{DateTime, Utc};

use crate::error::RulesError;
use crate::operation::Operation;
use crate::rules::{
    AssignmentRule, RedirectRule, TimestampedAssignmentRule, TimestampedRedirectRule,
    VersioningRules,
};

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;

/// Upper bounds on the number of rules per task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLimits {
    pub max_assignment_rules: usize,
    pub max_redirect_rules: usize,
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self {
            max_assignment_rules: 100,
            max_redirect_rules: 500,
        }
    }
}

/// Service state an operation is evaluated against.
pub struct ApplyContext<'a> {
    /// Creation time stamped on new or replaced rules.
    pub now: DateTime<Utc>,
    pub limits: RuleLimits,
    /// Whether workers running this Build ID polled the queue recently.
    pub has_recent_pollers: &'a (dyn Fn(&str) -> bool + 'a),
}

/// Apply `op` to `rules`, returning the resulting rules.
pub fn apply(
    rules: &VersioningRules,
    op: &Operation,
    ctx: &ApplyContext<'_>,
) -> Result<VersioningRules, RulesError> {
    op.validate()?;

    let mut next = rules.clone();
    match op {
        Operation::InsertAssignmentRule { rule_index, rule } => {
            check_assignment_capacity(&next, ctx.limits)?;
            let position = (*rule_index).min(next.assignment_rules.len());
            next.assignment_rules
                .insert(position, stamp_assignment(rule, ctx.now));
        }
        Operation::ReplaceAssignmentRule {
            rule_index,
            rule,
            force,
        } => {
            let len = next.assignment_rules.len();
            let slot = next
                .assignment_rules
                .get_mut(*rule_index)
                .ok_or_else(|| index_out_of_bounds(*rule_index, len))?;
            *slot = stamp_assignment(rule, ctx.now);
            check_unconditional_remains(rules, &next, *force)?;
        }
        Operation::DeleteAssignmentRule { rule_index, force } => {
            let len = next.assignment_rules.len();
            if *rule_index >= len {
                return Err(index_out_of_bounds(*rule_index, len));
            }
            next.assignment_rules.remove(*rule_index);
            check_unconditional_remains(rules, &next, *force)?;
        }
        Operation::CommitBuildId {
            target_build_id,
            force,
        } => {
            if !*force && !(ctx.has_recent_pollers)(target_build_id) {
                return Err(RulesError::validation(format!(
                    "no recent pollers seen for build ID '{}' on this task queue; use force to commit it anyway",
                    target_build_id
                )));
            }
            next.assignment_rules.retain(|r| {
                r.rule.target_build_id != *target_build_id && !r.rule.is_unconditional()
            });
            check_assignment_capacity(&next, ctx.limits)?;
            next.assignment_rules.push(stamp_assignment(
                &AssignmentRule::unconditional(target_build_id.as_str()),
                ctx.now,
            ));
        }
        Operation::AddRedirectRule { rule } => {
            if next.redirect_rules.contains_key(&rule.source_build_id) {
                return Err(RulesError::validation(format!(
                    "a redirect rule for source build ID '{}' already exists; replace it instead",
                    rule.source_build_id
                )));
            }
            if next.redirect_rules.len() >= ctx.limits.max_redirect_rules {
                return Err(RulesError::validation(format!(
                    "update exceeds the number of redirect rules permitted for the task queue ({})",
                    ctx.limits.max_redirect_rules
                )));
            }
            check_acyclic(&next, rule)?;
            next.redirect_rules.insert(
                rule.source_build_id.clone(),
                stamp_redirect(rule, ctx.now),
            );
        }
        Operation::ReplaceRedirectRule { rule } => {
            if !next.redirect_rules.contains_key(&rule.source_build_id) {
                return Err(missing_redirect(&rule.source_build_id));
            }
            check_acyclic(&next, rule)?;
            if let Some(slot) = next.redirect_rules.get_mut(&rule.source_build_id) {
                *slot = stamp_redirect(rule, ctx.now);
            }
        }
        Operation::DeleteRedirectRule { source_build_id } => {
            if next.redirect_rules.shift_remove(source_build_id).is_none() {
                return Err(missing_redirect(source_build_id));
            }
        }
    }

    Ok(next)
}

fn stamp_assignment(rule: &AssignmentRule, now: DateTime<Utc>) -> TimestampedAssignmentRule {
    TimestampedAssignmentRule {
        rule: rule.clone(),
        create_time: now,
    }
}

fn stamp_redirect(rule: &RedirectRule, now: DateTime<Utc>) -> TimestampedRedirectRule {
    TimestampedRedirectRule {
        rule: rule.clone(),
        create_time: now,
    }
}

fn index_out_of_bounds(index: usize, len: usize) -> RulesError {
    RulesError::not_found(format!(
        "rule index {} is out of bounds for assignment rule list of length {}",
        index, len
    ))
}

fn missing_redirect(source_build_id: &str) -> RulesError {
    RulesError::not_found(format!(
        "no redirect rule found for source build ID '{}'",
        source_build_id
    ))
}

fn check_assignment_capacity(rules: &VersioningRules, limits: RuleLimits) -> Result<(), RulesError> {
    if rules.assignment_rules.len() >= limits.max_assignment_rules {
        return Err(RulesError::validation(format!(
            "update exceeds the number of assignment rules permitted for the task queue ({})",
            limits.max_assignment_rules
        )));
    }
    Ok(())
}

/// Reject updates that drop the last unconditional rule unless forced.
fn check_unconditional_remains(
    before: &VersioningRules,
    after: &VersioningRules,
    force: bool,
) -> Result<(), RulesError> {
    if !force && before.has_unconditional() && !after.has_unconditional() {
        return Err(RulesError::validation(
            "update would remove the last unconditional assignment rule; use force to bypass this check",
        ));
    }
    Ok(())
}

fn check_acyclic(rules: &VersioningRules, rule: &RedirectRule) -> Result<(), RulesError> {
    if rules.redirects_reach(&rule.target_build_id, &rule.source_build_id) {
        return Err(RulesError::validation(format!(
            "redirect rule {} -> {} would create a redirect cycle",
            rule.source_build_id, rule.target_build_id
        )));
    }
    Ok(())
}

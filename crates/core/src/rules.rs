// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment and redirect rule model.
//!
//! Assignment rules are an ordered list: the service evaluates them from
//! position 0 and the first applicable rule wins. Redirect rules are keyed by
//! their source Build ID, so a source can only ever be redirected once.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::token::ConflictToken;

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;

/// Percentage at which an assignment rule applies to all matching traffic.
pub const UNCONDITIONAL_PERCENTAGE: f32 = 100.0;

/// Ramp condition attached to an assignment rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ramp {
    /// Route this percentage (0–100) of matching traffic to the target.
    Percentage(f32),
}

/// Routes new work to a target Build ID, optionally ramped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRule {
    pub target_build_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ramp: Option<Ramp>,
}

impl AssignmentRule {
    /// Rule with no ramp: applies to all matching traffic.
    pub fn unconditional(target_build_id: impl Into<String>) -> Self {
        Self {
            target_build_id: target_build_id.into(),
            ramp: None,
        }
    }

    /// Rule for `percentage` of traffic. A percentage of exactly 100 yields
    /// an unconditional rule rather than a 100% ramp.
    pub fn with_percentage(target_build_id: impl Into<String>, percentage: f32) -> Self {
        let ramp = if percentage == UNCONDITIONAL_PERCENTAGE {
            None
        } else {
            Some(Ramp::Percentage(percentage))
        };
        Self {
            target_build_id: target_build_id.into(),
            ramp,
        }
    }

    /// Resolved ramp percentage (100 when no ramp is attached).
    pub fn percentage(&self) -> f32 {
        match self.ramp {
            Some(Ramp::Percentage(p)) => p,
            None => UNCONDITIONAL_PERCENTAGE,
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.percentage() >= UNCONDITIONAL_PERCENTAGE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedAssignmentRule {
    pub rule: AssignmentRule,
    pub create_time: DateTime<Utc>,
}

/// Redirects already-assigned work from a source Build ID to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub source_build_id: String,
    pub target_build_id: String,
}

impl RedirectRule {
    pub fn new(source_build_id: impl Into<String>, target_build_id: impl Into<String>) -> Self {
        Self {
            source_build_id: source_build_id.into(),
            target_build_id: target_build_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedRedirectRule {
    pub rule: RedirectRule,
    pub create_time: DateTime<Utc>,
}

/// The rules of one task queue, without a version stamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersioningRules {
    #[serde(default)]
    pub assignment_rules: Vec<TimestampedAssignmentRule>,
    /// Keyed by source Build ID, in the order the service returns them.
    #[serde(default)]
    pub redirect_rules: IndexMap<String, TimestampedRedirectRule>,
}

impl VersioningRules {
    pub fn has_unconditional(&self) -> bool {
        self.assignment_rules
            .iter()
            .any(|r| r.rule.is_unconditional())
    }

    pub fn redirect(&self, source_build_id: &str) -> Option<&TimestampedRedirectRule> {
        self.redirect_rules.get(source_build_id)
    }

    /// Follow redirects from `build_id` and report whether they lead back to
    /// `origin`. Used to keep the redirect graph acyclic.
    pub fn redirects_reach(&self, build_id: &str, origin: &str) -> bool {
        let mut current = build_id;
        // Each hop consumes a distinct key while the graph is acyclic, so the
        // walk terminates within `len + 1` steps.
        for _ in 0..=self.redirect_rules.len() {
            if current == origin {
                return true;
            }
            match self.redirect_rules.get(current) {
                Some(next) => current = &next.rule.target_build_id,
                None => return false,
            }
        }
        true
    }
}

/// Rules as returned by the service, together with their conflict token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: VersioningRules,
    pub conflict_token: ConflictToken,
}

impl RuleSet {
    pub fn new(rules: VersioningRules, conflict_token: ConflictToken) -> Self {
        Self {
            rules,
            conflict_token,
        }
    }

    pub fn assignment_rules(&self) -> &[TimestampedAssignmentRule] {
        &self.rules.assignment_rules
    }

    pub fn redirect_rules(&self) -> impl Iterator<Item = &TimestampedRedirectRule> {
        self.rules.redirect_rules.values()
    }
}

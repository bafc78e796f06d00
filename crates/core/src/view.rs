// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Display-ready flattening of a rule set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRow {
    /// Evaluation position, shown to operators but left out of JSON.
    #[serde(skip)]
    pub position: usize,
    #[serde(rename = "targetBuildID")]
    pub target_build_id: String,
    #[serde(rename = "rampPercentage")]
    pub ramp_percentage: f32,
    #[serde(rename = "createTime")]
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectRow {
    #[serde(rename = "sourceBuildID")]
    pub source_build_id: String,
    #[serde(rename = "targetBuildID")]
    pub target_build_id: String,
    #[serde(rename = "createTime")]
    pub create_time: DateTime<Utc>,
}

/// Read-only rows derived from a [`RuleSet`]; holds no state of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesView {
    #[serde(rename = "assignmentRules")]
    pub assignment_rules: Vec<AssignmentRow>,
    #[serde(rename = "redirectRules")]
    pub redirect_rules: Vec<RedirectRow>,
}

impl From<&RuleSet> for RulesView {
    fn from(set: &RuleSet) -> Self {
        let assignment_rules = set
            .assignment_rules()
            .iter()
            .enumerate()
            .map(|(position, r)| AssignmentRow {
                position,
                target_build_id: r.rule.target_build_id.clone(),
                ramp_percentage: r.rule.percentage(),
                create_time: r.create_time,
            })
            .collect();

        let redirect_rules = set
            .redirect_rules()
            .map(|r| RedirectRow {
                source_build_id: r.rule.source_build_id.clone(),
                target_build_id: r.rule.target_build_id.clone(),
                create_time: r.create_time,
            })
            .collect();

        Self {
            assignment_rules,
            redirect_rules,
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::rules_of;
use crate::token::ConflictToken;

fn view_of(assignments: &[(&str, f32)], redirects: &[(&str, &str)]) -> RulesView {
    let set = RuleSet::new(rules_of(assignments, redirects), ConflictToken::from_bytes("t"));
    RulesView::from(&set)
}

#[test]
fn assignment_rows_carry_position_and_percentage() {
    let view = view_of(&[("id2", 40.0), ("id1", 100.0)], &[]);
    assert_eq!(view.assignment_rules.len(), 2);
    assert_eq!(view.assignment_rules[0].position, 0);
    assert_eq!(view.assignment_rules[0].target_build_id, "id2");
    assert_eq!(view.assignment_rules[0].ramp_percentage, 40.0);
    assert_eq!(view.assignment_rules[1].position, 1);
    assert_eq!(view.assignment_rules[1].ramp_percentage, 100.0);
}

#[test]
fn redirect_rows_follow_service_order() {
    let view = view_of(&[], &[("id3", "id5"), ("id1", "id2")]);
    let sources: Vec<&str> = view
        .redirect_rules
        .iter()
        .map(|r| r.source_build_id.as_str())
        .collect();
    assert_eq!(sources, vec!["id3", "id1"]);
}

#[test]
fn json_omits_position_and_uses_wire_keys() {
    let view = view_of(&[("id1", 100.0)], &[("id3", "id5")]);
    let json: serde_json::Value = serde_json::to_value(&view).unwrap();

    let rule = &json["assignmentRules"][0];
    assert_eq!(rule["targetBuildID"], "id1");
    assert_eq!(rule["rampPercentage"], 100.0);
    assert!(rule.get("position").is_none());
    assert!(rule["createTime"].as_str().unwrap().starts_with("2026-01-01T00:00:00"));

    let redirect = &json["redirectRules"][0];
    assert_eq!(redirect["sourceBuildID"], "id3");
    assert_eq!(redirect["targetBuildID"], "id5");
}

#[test]
fn empty_rule_set_serializes_empty_lists() {
    let view = view_of(&[], &[]);
    let json = serde_json::to_string(&view).unwrap();
    assert_eq!(json, r#"{"assignmentRules":[],"redirectRules":[]}"#);
}

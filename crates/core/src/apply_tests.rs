// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use crate::test_support::{assignment_pairs, redirect_pairs, rules_of};
use proptest::prelude::*;

fn no_pollers(_: &str) -> bool {
    false
}

fn all_pollers(_: &str) -> bool {
    true
}

fn ctx() -> ApplyContext<'static> {
    ApplyContext {
        now: FakeClock::default().now(),
        limits: RuleLimits::default(),
        has_recent_pollers: &no_pollers,
    }
}

fn pairs(items: &[(&str, f32)]) -> Vec<(String, f32)> {
    items.iter().map(|(t, p)| (t.to_string(), *p)).collect()
}

fn insert(index: usize, target: &str, pct: f32) -> Operation {
    Operation::InsertAssignmentRule {
        rule_index: index,
        rule: AssignmentRule::with_percentage(target, pct),
    }
}

fn replace(index: usize, target: &str, pct: f32, force: bool) -> Operation {
    Operation::ReplaceAssignmentRule {
        rule_index: index,
        rule: AssignmentRule::with_percentage(target, pct),
        force,
    }
}

fn add_redirect(source: &str, target: &str) -> Operation {
    Operation::AddRedirectRule {
        rule: RedirectRule::new(source, target),
    }
}

// -- Assignment rules ------------------------------------------------------

#[yare::parameterized(
    at_start       = { 0,   &[("new", 10.0), ("a", 100.0), ("b", 50.0)] },
    in_middle      = { 1,   &[("a", 100.0), ("new", 10.0), ("b", 50.0)] },
    at_end         = { 2,   &[("a", 100.0), ("b", 50.0), ("new", 10.0)] },
    beyond_end     = { 100, &[("a", 100.0), ("b", 50.0), ("new", 10.0)] },
)]
fn insert_clamps_position(index: usize, expected: &[(&str, f32)]) {
    let rules = rules_of(&[("a", 100.0), ("b", 50.0)], &[]);
    let next = apply(&rules, &insert(index, "new", 10.0), &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(expected));
}

#[test]
fn insert_stamps_create_time() {
    let clock = FakeClock::default();
    clock.advance(chrono::Duration::seconds(90));
    let ctx = ApplyContext {
        now: clock.now(),
        ..ctx()
    };
    let next = apply(&VersioningRules::default(), &insert(0, "a", 100.0), &ctx).unwrap();
    assert_eq!(next.assignment_rules[0].create_time, clock.now());
}

#[test]
fn insert_respects_assignment_limit() {
    let rules = rules_of(&[("a", 100.0), ("b", 10.0)], &[]);
    let ctx = ApplyContext {
        limits: RuleLimits {
            max_assignment_rules: 2,
            max_redirect_rules: 10,
        },
        ..ctx()
    };
    let err = apply(&rules, &insert(0, "c", 5.0), &ctx).unwrap_err();
    assert!(err.to_string().contains("exceeds the number of assignment rules"));
}

#[test]
fn replace_overwrites_in_place() {
    let rules = rules_of(&[("a", 10.0), ("b", 100.0)], &[]);
    let next = apply(&rules, &replace(0, "c", 40.0, false), &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("c", 40.0), ("b", 100.0)]));
}

#[test]
fn replace_out_of_bounds_is_not_found() {
    let rules = rules_of(&[("a", 100.0)], &[]);
    let err = apply(&rules, &replace(1, "b", 100.0, false), &ctx()).unwrap_err();
    assert!(matches!(err, RulesError::NotFound(_)));
}

#[test]
fn replacing_sole_unconditional_rule_requires_force() {
    let rules = rules_of(&[("a", 10.0), ("b", 100.0)], &[]);

    let err = apply(&rules, &replace(1, "b", 50.0, false), &ctx()).unwrap_err();
    assert!(matches!(err, RulesError::Validation(_)));
    assert!(err.to_string().contains("last unconditional"));

    let next = apply(&rules, &replace(1, "b", 50.0, true), &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("a", 10.0), ("b", 50.0)]));
}

#[test]
fn deleting_shifts_later_rules_up() {
    let rules = rules_of(&[("a", 10.0), ("b", 20.0), ("c", 100.0)], &[]);
    let op = Operation::DeleteAssignmentRule {
        rule_index: 0,
        force: false,
    };
    let next = apply(&rules, &op, &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("b", 20.0), ("c", 100.0)]));
}

#[test]
fn deleting_sole_unconditional_rule_requires_force() {
    let rules = rules_of(&[("a", 10.0), ("b", 100.0)], &[]);
    let delete = |force| Operation::DeleteAssignmentRule {
        rule_index: 1,
        force,
    };

    let err = apply(&rules, &delete(false), &ctx()).unwrap_err();
    assert!(matches!(err, RulesError::Validation(_)));

    let next = apply(&rules, &delete(true), &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("a", 10.0)]));
}

#[test]
fn deleting_one_of_two_unconditional_rules_is_allowed() {
    let rules = rules_of(&[("a", 100.0), ("b", 100.0)], &[]);
    let op = Operation::DeleteAssignmentRule {
        rule_index: 0,
        force: false,
    };
    assert!(apply(&rules, &op, &ctx()).is_ok());
}

#[test]
fn delete_out_of_bounds_is_not_found() {
    let op = Operation::DeleteAssignmentRule {
        rule_index: 0,
        force: true,
    };
    let err = apply(&VersioningRules::default(), &op, &ctx()).unwrap_err();
    assert!(matches!(err, RulesError::NotFound(_)));
}

// -- Commit ----------------------------------------------------------------

#[test]
fn commit_requires_recent_pollers_unless_forced() {
    let rules = rules_of(&[("a", 100.0)], &[]);
    let commit = |force| Operation::CommitBuildId {
        target_build_id: "b".to_string(),
        force,
    };

    let err = apply(&rules, &commit(false), &ctx()).unwrap_err();
    assert!(err.to_string().contains("no recent pollers"));

    let with_pollers = ApplyContext {
        has_recent_pollers: &all_pollers,
        ..ctx()
    };
    assert!(apply(&rules, &commit(false), &with_pollers).is_ok());
    assert!(apply(&rules, &commit(true), &ctx()).is_ok());
}

#[test]
fn commit_leaves_single_unconditional_rule() {
    let rules = rules_of(&[("x", 40.0), ("a", 100.0), ("x", 5.0), ("b", 100.0)], &[]);
    let op = Operation::CommitBuildId {
        target_build_id: "x".to_string(),
        force: true,
    };
    let next = apply(&rules, &op, &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("x", 100.0)]));
}

#[test]
fn commit_keeps_ramped_rules_for_other_build_ids() {
    let rules = rules_of(&[("y", 10.0), ("x", 20.0), ("a", 100.0)], &[]);
    let op = Operation::CommitBuildId {
        target_build_id: "x".to_string(),
        force: true,
    };
    let next = apply(&rules, &op, &ctx()).unwrap();
    assert_eq!(assignment_pairs(&next), pairs(&[("y", 10.0), ("x", 100.0)]));
}

// -- Redirect rules --------------------------------------------------------

#[test]
fn add_redirect_rejects_duplicate_source() {
    let rules = rules_of(&[], &[("a", "b")]);
    let err = apply(&rules, &add_redirect("a", "c"), &ctx()).unwrap_err();
    assert!(matches!(err, RulesError::Validation(_)));
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn add_redirect_rejects_cycle() {
    let rules = rules_of(&[], &[("a", "b"), ("b", "c")]);
    let err = apply(&rules, &add_redirect("c", "a"), &ctx()).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn add_redirect_respects_limit() {
    let rules = rules_of(&[], &[("a", "b")]);
    let ctx = ApplyContext {
        limits: RuleLimits {
            max_assignment_rules: 10,
            max_redirect_rules: 1,
        },
        ..ctx()
    };
    let err = apply(&rules, &add_redirect("c", "d"), &ctx).unwrap_err();
    assert!(err.to_string().contains("redirect rules permitted"));
}

#[test]
fn replace_and_delete_redirect_require_existing_source() {
    let rules = VersioningRules::default();
    let replace = Operation::ReplaceRedirectRule {
        rule: RedirectRule::new("a", "b"),
    };
    let delete = Operation::DeleteRedirectRule {
        source_build_id: "a".to_string(),
    };
    assert!(matches!(
        apply(&rules, &replace, &ctx()),
        Err(RulesError::NotFound(_))
    ));
    assert!(matches!(
        apply(&rules, &delete, &ctx()),
        Err(RulesError::NotFound(_))
    ));
}

#[test]
fn replace_redirect_keeps_position() {
    let rules = rules_of(&[], &[("a", "b"), ("c", "d")]);
    let op = Operation::ReplaceRedirectRule {
        rule: RedirectRule::new("a", "z"),
    };
    let next = apply(&rules, &op, &ctx()).unwrap();
    assert_eq!(
        redirect_pairs(&next),
        vec![("a".into(), "z".into()), ("c".into(), "d".into())]
    );
}

#[test]
fn add_replace_delete_leaves_no_redirect() {
    let mut rules = VersioningRules::default();
    for op in [
        add_redirect("a", "b"),
        Operation::ReplaceRedirectRule {
            rule: RedirectRule::new("a", "c"),
        },
        Operation::DeleteRedirectRule {
            source_build_id: "a".to_string(),
        },
    ] {
        rules = apply(&rules, &op, &ctx()).unwrap();
    }
    assert!(rules.redirect("a").is_none());
}

// -- Scenario --------------------------------------------------------------

#[test]
fn rollout_scenario_on_empty_queue() {
    let mut rules = VersioningRules::default();

    rules = apply(&rules, &insert(0, "id1", 100.0), &ctx()).unwrap();
    assert_eq!(assignment_pairs(&rules), pairs(&[("id1", 100.0)]));

    rules = apply(&rules, &insert(0, "id2", 10.0), &ctx()).unwrap();
    assert_eq!(
        assignment_pairs(&rules),
        pairs(&[("id2", 10.0), ("id1", 100.0)])
    );

    rules = apply(&rules, &replace(0, "id2", 40.0, false), &ctx()).unwrap();
    assert_eq!(
        assignment_pairs(&rules),
        pairs(&[("id2", 40.0), ("id1", 100.0)])
    );

    let commit = Operation::CommitBuildId {
        target_build_id: "id2".to_string(),
        force: true,
    };
    rules = apply(&rules, &commit, &ctx()).unwrap();
    assert_eq!(assignment_pairs(&rules), pairs(&[("id2", 100.0)]));
}

#[test]
fn failed_apply_leaves_input_untouched() {
    let rules = rules_of(&[("a", 100.0)], &[("s", "t")]);
    let before = rules.clone();
    let _ = apply(&rules, &add_redirect("s", "u"), &ctx());
    assert_eq!(rules, before);
}

// -- Properties ------------------------------------------------------------

fn arb_rules() -> impl Strategy<Value = Vec<(String, f32)>> {
    prop::collection::vec(
        ("[a-e]", prop_oneof![Just(100.0f32), 0.0f32..100.0]),
        0..8,
    )
}

fn build(items: &[(String, f32)]) -> VersioningRules {
    let borrowed: Vec<(&str, f32)> = items.iter().map(|(t, p)| (t.as_str(), *p)).collect();
    rules_of(&borrowed, &[])
}

proptest! {
    #[test]
    fn insert_lands_at_clamped_position(items in arb_rules(), index in 0usize..12) {
        let rules = build(&items);
        let next = apply(&rules, &insert(index, "new", 25.0), &ctx()).unwrap();
        let expected = index.min(items.len());
        prop_assert_eq!(next.assignment_rules.len(), items.len() + 1);
        prop_assert_eq!(&next.assignment_rules[expected].rule.target_build_id, "new");
    }

    #[test]
    fn forced_replace_preserves_length(items in arb_rules(), index in 0usize..8) {
        prop_assume!(index < items.len());
        let rules = build(&items);
        let next = apply(&rules, &replace(index, "new", 30.0, true), &ctx()).unwrap();
        prop_assert_eq!(next.assignment_rules.len(), items.len());
        for (i, rule) in next.assignment_rules.iter().enumerate() {
            if i != index {
                prop_assert_eq!(rule, &rules.assignment_rules[i]);
            }
        }
    }

    #[test]
    fn forced_delete_shifts_later_rules(items in arb_rules(), index in 0usize..8) {
        prop_assume!(index < items.len());
        let rules = build(&items);
        let op = Operation::DeleteAssignmentRule { rule_index: index, force: true };
        let next = apply(&rules, &op, &ctx()).unwrap();
        prop_assert_eq!(next.assignment_rules.len(), items.len() - 1);
        for i in index..next.assignment_rules.len() {
            prop_assert_eq!(&next.assignment_rules[i], &rules.assignment_rules[i + 1]);
        }
    }
}

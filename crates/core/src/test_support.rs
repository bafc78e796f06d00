// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::apply::{apply, ApplyContext, RuleLimits};
use crate::clock::{Clock, FakeClock};
use crate::client::RulesClient;
use crate::error::RulesError;
use crate::operation::Operation;
use crate::rules::{
    AssignmentRule, RedirectRule, RuleSet, TimestampedAssignmentRule, TimestampedRedirectRule,
    VersioningRules,
};
use crate::token::ConflictToken;

// ── Rule factory functions ──────────────────────────────────────────────────

/// Build rules from `(target, percentage)` and `(source, target)` pairs,
/// stamped with the default fake clock time.
pub fn rules_of(assignments: &[(&str, f32)], redirects: &[(&str, &str)]) -> VersioningRules {
    let now = FakeClock::default().now();
    VersioningRules {
        assignment_rules: assignments
            .iter()
            .map(|(target, pct)| TimestampedAssignmentRule {
                rule: AssignmentRule::with_percentage(*target, *pct),
                create_time: now,
            })
            .collect(),
        redirect_rules: redirects
            .iter()
            .map(|(source, target)| {
                (
                    source.to_string(),
                    TimestampedRedirectRule {
                        rule: RedirectRule::new(*source, *target),
                        create_time: now,
                    },
                )
            })
            .collect(),
    }
}

/// `(target, percentage)` pairs of the assignment rules, in order.
pub fn assignment_pairs(rules: &VersioningRules) -> Vec<(String, f32)> {
    rules
        .assignment_rules
        .iter()
        .map(|r| (r.rule.target_build_id.clone(), r.rule.percentage()))
        .collect()
}

/// `(source, target)` pairs of the redirect rules, in order.
pub fn redirect_pairs(rules: &VersioningRules) -> Vec<(String, String)> {
    rules
        .redirect_rules
        .values()
        .map(|r| (r.rule.source_build_id.clone(), r.rule.target_build_id.clone()))
        .collect()
}

// ── Fake client ─────────────────────────────────────────────────────────────

/// Recorded client call
#[derive(Debug, Clone, PartialEq)]
pub enum RulesCall {
    GetRules { task_queue: String },
    UpdateRules { task_queue: String, op: Operation },
}

#[derive(Default)]
struct FakeQueue {
    rules: VersioningRules,
    version: u64,
}

#[derive(Default)]
struct FakeRulesState {
    queues: HashMap<String, FakeQueue>,
    pollers: HashSet<(String, String)>,
    calls: Vec<RulesCall>,
    transport_failure: Option<String>,
}

/// In-memory rules service for testing.
///
/// Applies operations with the same semantics as a real service and records
/// every call.
#[derive(Clone)]
pub struct FakeRulesClient {
    inner: Arc<Mutex<FakeRulesState>>,
    clock: FakeClock,
    limits: RuleLimits,
}

impl Default for FakeRulesClient {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRulesState::default())),
            clock: FakeClock::default(),
            limits: RuleLimits::default(),
        }
    }
}

impl FakeRulesClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: RuleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the rules of `task_queue`, bumping its version.
    pub fn seed(&self, task_queue: &str, rules: VersioningRules) {
        let mut state = self.inner.lock();
        let queue = state.queues.entry(task_queue.to_string()).or_default();
        queue.rules = rules;
        queue.version += 1;
    }

    /// Mark `build_id` as recently polled on `task_queue`.
    pub fn add_poller(&self, task_queue: &str, build_id: &str) {
        self.inner
            .lock()
            .pollers
            .insert((task_queue.to_string(), build_id.to_string()));
    }

    /// Make every subsequent call fail with a transport error.
    pub fn fail_with_transport(&self, message: &str) {
        self.inner.lock().transport_failure = Some(message.to_string());
    }

    /// Apply `op` as another operator would, invalidating earlier tokens.
    pub fn concurrent_update(&self, task_queue: &str, op: &Operation) -> Result<(), RulesError> {
        let mut state = self.inner.lock();
        Self::apply_locked(&mut state, &self.clock, self.limits, task_queue, op)?;
        Ok(())
    }

    pub fn rules(&self, task_queue: &str) -> VersioningRules {
        self.inner
            .lock()
            .queues
            .get(task_queue)
            .map(|q| q.rules.clone())
            .unwrap_or_default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RulesCall> {
        self.inner.lock().calls.clone()
    }

    pub fn update_calls(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RulesCall::UpdateRules { .. }))
            .count()
    }

    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    fn token(task_queue: &str, version: u64) -> ConflictToken {
        ConflictToken::from_bytes(format!("{}#{}", task_queue, version))
    }

    fn apply_locked(
        state: &mut FakeRulesState,
        clock: &FakeClock,
        limits: RuleLimits,
        task_queue: &str,
        op: &Operation,
    ) -> Result<RuleSet, RulesError> {
        let pollers = state.pollers.clone();
        let has_recent_pollers =
            |build_id: &str| pollers.contains(&(task_queue.to_string(), build_id.to_string()));
        let queue = state.queues.entry(task_queue.to_string()).or_default();
        let ctx = ApplyContext {
            now: clock.now(),
            limits,
            has_recent_pollers: &has_recent_pollers,
        };
        queue.rules = apply(&queue.rules, op, &ctx)?;
        queue.version += 1;
        Ok(RuleSet::new(
            queue.rules.clone(),
            Self::token(task_queue, queue.version),
        ))
    }
}

#[async_trait]
impl RulesClient for FakeRulesClient {
    async fn get_rules(&self, task_queue: &str) -> Result<RuleSet, RulesError> {
        let mut state = self.inner.lock();
        state.calls.push(RulesCall::GetRules {
            task_queue: task_queue.to_string(),
        });
        if let Some(msg) = &state.transport_failure {
            return Err(RulesError::transport(msg.clone()));
        }
        let queue = state.queues.entry(task_queue.to_string()).or_default();
        Ok(RuleSet::new(
            queue.rules.clone(),
            Self::token(task_queue, queue.version),
        ))
    }

    async fn update_rules(
        &self,
        task_queue: &str,
        token: &ConflictToken,
        op: Operation,
    ) -> Result<RuleSet, RulesError> {
        let mut state = self.inner.lock();
        state.calls.push(RulesCall::UpdateRules {
            task_queue: task_queue.to_string(),
            op: op.clone(),
        });
        if let Some(msg) = &state.transport_failure {
            return Err(RulesError::transport(msg.clone()));
        }
        let version = state
            .queues
            .get(task_queue)
            .map(|q| q.version)
            .unwrap_or_default();
        if *token != Self::token(task_queue, version) {
            return Err(RulesError::Conflict);
        }
        Self::apply_locked(&mut state, &self.clock, self.limits, task_queue, &op)
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;

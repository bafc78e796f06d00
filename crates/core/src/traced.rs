// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced client wrapper for consistent observability

use async_trait::async_trait;
use tracing::Instrument;

use crate::client::RulesClient;
use crate::error::RulesError;
use crate::operation::Operation;
use crate::rules::RuleSet;
use crate::token::ConflictToken;

/// Wrapper that adds tracing to any RulesClient
#[derive(Clone)]
pub struct TracedRulesClient<C> {
    inner: C,
}

impl<C> TracedRulesClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: RulesClient> RulesClient for TracedRulesClient<C> {
    async fn get_rules(&self, task_queue: &str) -> Result<RuleSet, RulesError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get_rules(task_queue).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(rules) => tracing::debug!(
                    elapsed_ms,
                    assignment_rules = rules.rules.assignment_rules.len(),
                    redirect_rules = rules.rules.redirect_rules.len(),
                    "fetched rules"
                ),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "get_rules failed"),
            }
            result
        }
        .instrument(tracing::debug_span!("rules.get", task_queue))
        .await
    }

    async fn update_rules(
        &self,
        task_queue: &str,
        token: &ConflictToken,
        op: Operation,
    ) -> Result<RuleSet, RulesError> {
        let op_name = op.name();
        async {
            tracing::debug!("submitting");
            let start = std::time::Instant::now();
            let result = self.inner.update_rules(task_queue, token, op).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(rules) => tracing::info!(
                    elapsed_ms,
                    assignment_rules = rules.rules.assignment_rules.len(),
                    redirect_rules = rules.rules.redirect_rules.len(),
                    "rules updated"
                ),
                Err(RulesError::Conflict) => {
                    tracing::warn!(elapsed_ms, "stale conflict token")
                }
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "update rejected"),
            }
            result
        }
        .instrument(tracing::debug_span!("rules.update", task_queue, op = op_name))
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary to the service that owns a task queue's versioning rules.

use async_trait::async_trait;

use crate::error::RulesError;
use crate::operation::Operation;
use crate::rules::RuleSet;
use crate::token::ConflictToken;

/// Client for reading and updating Build ID versioning rules.
#[async_trait]
pub trait RulesClient: Send + Sync {
    /// Fetch the current rules and their conflict token.
    async fn get_rules(&self, task_queue: &str) -> Result<RuleSet, RulesError>;

    /// Apply one operation if `token` still matches the current version.
    ///
    /// Returns the rules after the update, with a fresh token.
    async fn update_rules(
        &self,
        task_queue: &str,
        token: &ConflictToken,
        op: Operation,
    ) -> Result<RuleSet, RulesError>;
}


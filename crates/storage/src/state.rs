// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted per-queue state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tq_core::{ConflictToken, RuleSet, VersioningRules};

/// Everything the store knows about one task queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueState {
    pub task_queue: String,
    /// Incremented on every applied update.
    pub version: u64,
    pub conflict_token: ConflictToken,
    #[serde(default)]
    pub rules: VersioningRules,
    /// Last poll time by Build ID.
    #[serde(default)]
    pub pollers: BTreeMap<String, DateTime<Utc>>,
}

impl QueueState {
    pub fn new(task_queue: &str, conflict_token: ConflictToken) -> Self {
        Self {
            task_queue: task_queue.to_string(),
            version: 0,
            conflict_token,
            rules: VersioningRules::default(),
            pollers: BTreeMap::new(),
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.clone(), self.conflict_token.clone())
    }

    pub fn has_recent_poller(
        &self,
        build_id: &str,
        now: DateTime<Utc>,
        window: chrono::Duration,
    ) -> bool {
        self.pollers
            .get(build_id)
            .is_some_and(|seen| now - *seen <= window)
    }
}

/// A worker poll seen for a Build ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollerRecord {
    pub build_id: String,
    pub last_seen: DateTime<Utc>,
    pub recent: bool,
}

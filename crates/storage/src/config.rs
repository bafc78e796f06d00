// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `config.toml` in the state directory.

use serde::Deserialize;
use std::path::Path;
use tq_core::RuleLimits;

use crate::store::StoreError;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Tunables for the local rules store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub max_assignment_rules: usize,
    pub max_redirect_rules: usize,
    /// How long a poller counts as recent for `commit-build-id`.
    pub poller_window_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let limits = RuleLimits::default();
        Self {
            max_assignment_rules: limits.max_assignment_rules,
            max_redirect_rules: limits.max_redirect_rules,
            poller_window_secs: 300,
        }
    }
}

impl StoreConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| StoreError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn limits(&self) -> RuleLimits {
        RuleLimits {
            max_assignment_rules: self.max_assignment_rules,
            max_redirect_rules: self.max_redirect_rules,
        }
    }

    pub fn poller_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.poller_window_secs.min(u64::from(u32::MAX)) as i64)
    }
}

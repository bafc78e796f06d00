// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by a rules service.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RulesError {
    /// The requested update violates a rule-set invariant.
    #[error("{0}")]
    Validation(String),

    /// The conflict token no longer matches the service's current version.
    #[error(
        "versioning rules were modified concurrently (stale conflict token); please re-run the command"
    )]
    Conflict,

    /// A referenced position or redirect source does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Connectivity or storage failure below the rules protocol.
    #[error("{0}")]
    Transport(String),
}

impl RulesError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

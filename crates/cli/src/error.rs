// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by `tq versioning` commands.

use thiserror::Error;
use tq_core::RulesError;

use crate::output::RenderError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rules(RulesError),

    #[error("unable to {action} versioning rules: {message}")]
    Transport {
        action: &'static str,
        message: String,
    },

    #[error("user denied confirmation")]
    UserDeclined,

    #[error("must bypass prompts when using JSON output")]
    ModeConflict,

    #[error("failed to read confirmation: {0}")]
    Confirm(#[source] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CommandError {
    /// Wrap a client error; transport failures gain the `get`/`update` context.
    pub fn from_rules(action: &'static str, err: RulesError) -> Self {
        match err {
            RulesError::Transport(message) => CommandError::Transport { action, message },
            other => CommandError::Rules(other),
        }
    }
}

impl From<std::io::Error> for CommandError {
    fn from(e: std::io::Error) -> Self {
        CommandError::Render(RenderError::Io(e))
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that carry a specific process exit code.

use std::fmt;

/// Exit code for Ctrl-C, following the shell convention of 128 + SIGINT.
pub const EXIT_INTERRUPTED: i32 = 130;
/// Exit code when `--command-timeout` elapses (matches `timeout(1)`).
pub const EXIT_TIMED_OUT: i32 = 124;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}

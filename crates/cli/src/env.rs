// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

// --- Duration helper (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- State directory ---

/// Resolve state directory: TQ_STATE_DIR > XDG_STATE_HOME/tq > ~/.local/state/tq
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TQ_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("tq"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/tq"))
}

// --- Logging ---

/// Log filter directive, e.g. `debug` or `tq_storage=trace`.
pub fn log_filter() -> Option<String> {
    std::env::var("TQ_LOG").ok().filter(|s| !s.is_empty())
}

// --- Color ---

pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

// --- Timeouts ---

pub fn command_timeout_ms() -> Option<Duration> {
    parse_duration_ms("TQ_COMMAND_TIMEOUT_MS")
}

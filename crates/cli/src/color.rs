// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::IsTerminal;

use clap::builder::styling::{Ansi256Color, Styles};

pub mod codes {
    /// Section headers: pastel cyan / steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;

    /// Pre-formatted ANSI escape sequences for use in tests
    #[cfg(test)]
    pub const HEADER_START: &str = "\x1b[38;5;74m";
    #[cfg(test)]
    pub const MUTED_START: &str = "\x1b[38;5;240m";
    #[cfg(test)]
    pub const RESET: &str = "\x1b[0m";
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Same priority as [`should_colorize`], checked against stderr for logs.
pub fn stderr_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stderr().is_terminal()
}

/// Clap help styles using the same palette as command output.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Ansi256Color(codes::HEADER).on_default())
        .usage(Ansi256Color(codes::HEADER).on_default())
        .literal(Ansi256Color(codes::LITERAL).on_default())
        .placeholder(Ansi256Color(codes::CONTEXT).on_default())
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Format text with the header color when `colorize` is set.
pub fn header(text: &str, colorize: bool) -> String {
    if colorize {
        apply_header(text)
    } else {
        text.to_string()
    }
}

/// Apply header color unconditionally (caller decides whether to use this).
pub(crate) fn apply_header(text: &str) -> String {
    format!("{}{}{}", fg256(codes::HEADER), text, RESET)
}

/// Format text with the muted color when `colorize` is set.
pub fn muted(text: &str, colorize: bool) -> String {
    if colorize {
        apply_muted(text)
    } else {
        text.to_string()
    }
}

/// Apply muted color unconditionally (caller decides whether to use this).
pub(crate) fn apply_muted(text: &str) -> String {
    format!("{}{}{}", fg256(codes::MUTED), text, RESET)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;

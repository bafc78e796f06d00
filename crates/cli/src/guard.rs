// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict token acquisition with optional preview and confirmation.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use tq_core::{ConflictToken, PreviewKind, RulesClient, RulesView};

use crate::error::CommandError;
use crate::output::{self, OutputFormat};

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;

/// Asks the operator whether to proceed.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

#[async_trait]
impl<F> Confirmer for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        Ok(self(prompt))
    }
}

/// Prompts on stdout and reads one line from stdin.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{} ", prompt)?;
            stdout.flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(is_affirmative(&answer))
    }
}

/// `y` or `yes`, ignoring case and surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Fetches a fresh conflict token, previewing and confirming in safe mode.
pub struct ConflictTokenGuard<'a, C: ?Sized, F: ?Sized> {
    pub client: &'a C,
    pub confirmer: &'a F,
    pub format: OutputFormat,
    pub colorize: bool,
}

impl<C, F> ConflictTokenGuard<'_, C, F>
where
    C: RulesClient + ?Sized,
    F: Confirmer + ?Sized,
{
    pub async fn acquire(
        &self,
        task_queue: &str,
        safe_mode: bool,
        preview_kind: PreviewKind,
        description: &str,
        out: &mut (impl Write + Send),
    ) -> Result<ConflictToken, CommandError> {
        if safe_mode && self.format.is_structured() {
            return Err(CommandError::ModeConflict);
        }

        let set = self
            .client
            .get_rules(task_queue)
            .await
            .map_err(|e| CommandError::from_rules("get", e))?;
        tracing::debug!(task_queue, safe_mode, "token acquired");

        if safe_mode {
            let view = RulesView::from(&set);
            output::print_preview(out, &view, preview_kind, self.colorize)?;
            out.flush()?;
            let prompt = format!("Continue with rules update {}? y/N", description);
            let confirmed = self
                .confirmer
                .confirm(&prompt)
                .await
                .map_err(CommandError::Confirm)?;
            if !confirmed {
                tracing::debug!(task_queue, "confirmation declined");
                return Err(CommandError::UserDeclined);
            }
            tracing::debug!(task_queue, "preview confirmed");
        }

        Ok(set.conflict_token)
    }
}

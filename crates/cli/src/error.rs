// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct FrdError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl FrdError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for FrdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for FrdError {}

/// Common error builders for typical failure scenarios.
impl FrdError {
    pub fn unknown_store(id: &str, known: &[&str]) -> Self {
        FrdError::new(format!("Unknown store '{}'", id))
            .with_context(format!("Registered stores: {}", known.join(", ")))
            .with_suggestion("List snapshots for every store: frd snapshots")
    }

    pub fn remote_not_configured() -> Self {
        FrdError::new("Remote API not configured")
            .with_context("Both remote.base_url and an API key are required")
            .with_suggestion("Set [remote] base_url in frd.toml")
            .with_suggestion(format!(
                "Provide the key as remote.api_key or via {}",
                frd_core::config::API_KEY_ENV
            ))
    }

    pub fn mirror_needs_confirmation() -> Self {
        FrdError::new("Mirror overwrites every local room and deletes rooms the remote lacks")
            .with_context("Local edit history is replaced by the remote's")
            .with_suggestion("Re-run with --yes to confirm: frd mirror --yes")
            .with_suggestion("Use `frd sync` for a non-destructive reconciliation")
    }

    pub fn snapshot_out_of_range(store: &str, index: usize, available: usize) -> Self {
        FrdError::new(format!("Store '{}' has no snapshot #{}", store, index))
            .with_context(format!("{} snapshot(s) available", available))
            .with_suggestion(format!("List them: frd snapshots {}", store))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

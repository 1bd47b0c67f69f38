// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_lists_context_and_numbered_suggestions() {
    let err = FrdError::new("Something went wrong")
        .with_context("First context")
        .with_suggestion("Try this")
        .with_suggestion("Or this");

    let output = err.to_string();
    assert!(output.contains("error: Something went wrong"));
    assert!(output.contains("-> First context"));
    assert!(output.contains("1. Try this"));
    assert!(output.contains("2. Or this"));
}

#[test]
fn unknown_store_names_the_registered_ones() {
    let output = FrdError::unknown_store("nope.db", &["frd_bot.db", "frd_room.db"]).to_string();
    assert!(output.contains("'nope.db'"));
    assert!(output.contains("frd_bot.db, frd_room.db"));
}

#[test]
fn remote_not_configured_mentions_env_var() {
    let output = FrdError::remote_not_configured().to_string();
    assert!(output.contains("FRD_API_KEY"));
}

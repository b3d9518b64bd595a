// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only guard for drafted queries.
//!
//! Drafts are rejected before execution when they are anything other
//! than a single SELECT statement. The guard is deliberately
//! conservative: a write keyword anywhere in the statement fails it,
//! even inside a string literal.

use std::sync::OnceLock;

use regex::Regex;

/// Statement-level keywords that make a draft non-read-only.
const WRITE_KEYWORD_PATTERN: &str = r"(?i)\b(insert|update|delete|drop|alter|create|replace|truncate|attach|detach|pragma|vacuum|reindex)\b";

fn write_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(WRITE_KEYWORD_PATTERN).expect("write keyword pattern is valid"))
}

/// Validates that a drafted query is a single read-only statement.
///
/// Returns the reason on rejection.
pub fn ensure_read_only(sql: &str) -> Result<(), String> {
    let stripped = strip_leading_comments(sql);
    if stripped.is_empty() {
        return Err("empty statement".to_string());
    }

    let first_word = stripped
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase();
    if first_word != "SELECT" && first_word != "WITH" {
        return Err(format!("statement must start with SELECT or WITH, got {first_word}"));
    }

    // Allow one trailing semicolon; anything after it is a second statement.
    let body = stripped.trim_end().trim_end_matches(';');
    if body.contains(';') {
        return Err("multiple statements are not allowed".to_string());
    }

    if let Some(found) = write_keyword_re().find(body) {
        return Err(format!("write keyword {:?} is not allowed", found.as_str()));
    }

    Ok(())
}

/// Drops leading `--` line comments and surrounding whitespace.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    while rest.starts_with("--") {
        rest = match rest.split_once('\n') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest.trim_end()
}

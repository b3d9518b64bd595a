// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compact digest of a session's cached retrieval artifacts.
//!
//! The digest is what the reuse judge shows the model instead of the raw
//! artifacts: what ran last, which tables and documents were consulted,
//! how much data came back, and a one-line summary of the last answer.

use porchlight_core::AnswerMode;

/// Summary of the most recent retrieval artifacts for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedDigest {
    /// Mode of the last answered turn.
    pub last_mode: AnswerMode,
    /// Tables consulted by the cached structured result, if any.
    pub tables: Vec<String>,
    /// Source documents of the cached unstructured result, if any.
    pub sources: Vec<String>,
    /// Row count of the cached structured result.
    pub row_count: usize,
    /// Chunk count of the cached unstructured result.
    pub chunk_count: usize,
    /// One-line summary of the last answer.
    pub answer_summary: String,
}

/// Longest answer prefix carried into the digest.
const SUMMARY_MAX_CHARS: usize = 240;

impl CachedDigest {
    /// Produces the one-line summary used for `answer_summary`: the first
    /// line of the answer, truncated on a char boundary.
    pub fn summarise_answer(answer: &str) -> String {
        let first_line = answer.lines().next().unwrap_or("").trim();
        if first_line.chars().count() <= SUMMARY_MAX_CHARS {
            return first_line.to_string();
        }
        let truncated: String = first_line.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{truncated}…")
    }

    /// Renders the digest as the prompt block handed to `plan_reuse`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("last mode: {}\n", self.last_mode));
        if !self.tables.is_empty() {
            out.push_str(&format!("tables consulted: {}\n", self.tables.join(", ")));
        }
        if !self.sources.is_empty() {
            out.push_str(&format!("documents consulted: {}\n", self.sources.join(", ")));
        }
        out.push_str(&format!(
            "rows cached: {}, chunks cached: {}\n",
            self.row_count, self.chunk_count
        ));
        out.push_str(&format!("last answer: {}\n", self.answer_summary));
        out
    }
}

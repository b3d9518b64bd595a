// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Porchlight QA router.

use thiserror::Error;

/// The primary error type used across the Porchlight workspace.
#[derive(Debug, Error)]
pub enum PorchlightError {
    /// Configuration errors (invalid TOML, missing required fields, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM provider transport errors (API failure, rate limits, malformed responses).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model's output violated a gateway operation's declared shape after retry.
    #[error("model contract violation in {operation}: {detail}")]
    ModelContract { operation: String, detail: String },

    /// Database executor errors (connection, query execution).
    #[error("executor error: {message}")]
    Executor {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document index errors (index unavailable, search failure).
    #[error("index error: {message}")]
    Index {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding computation failed while servicing an index search.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// A drafted query was rejected by the read-only guard before execution.
    #[error("drafted query is not read-only")]
    NonReadOnlyQuery { sql: String },

    /// Storage backend errors (interaction log, catalog metadata).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PorchlightError {
    /// True for the two error kinds that must surface to the caller as
    /// internal failures rather than downgrade the turn.
    pub fn is_internal_failure(&self) -> bool {
        matches!(
            self,
            PorchlightError::ModelContract { .. } | PorchlightError::NonReadOnlyQuery { .. }
        )
    }
}

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction log collaborator. Fire-and-forget: sink failures must
//! never affect the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PorchlightError;

/// Summary of one completed turn for the interaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub session_id: String,
    pub question: String,
    pub answer: String,
    /// The reply envelope's mode tag.
    pub mode: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
}

/// Persists turn summaries and user feedback ratings.
#[async_trait]
pub trait InteractionSink: Send + Sync {
    /// Records a turn summary, returning the new log entry's id.
    async fn record(&self, record: &InteractionRecord) -> Result<i64, PorchlightError>;

    /// Attaches a feedback rating to an existing log entry.
    async fn rate(&self, log_id: i64, rating: &str) -> Result<(), PorchlightError>;
}

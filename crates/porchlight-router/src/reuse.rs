// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reuse judge: decides whether a session's cached artifacts suffice
//! to answer the new turn.
//!
//! The judge never fails a turn. A missing or artifact-free entry is an
//! immediate refresh, a temporal shift forces a refresh without a model
//! call, and any model-side problem (contract violation or transport
//! error) falls back to refresh.

use std::sync::Arc;

use porchlight_core::{AnswerMode, RefreshReason, ReuseReason, ReuseVerdict, Turn};
use porchlight_llm::{CachedDigest, LlmGateway, ReuseToken};
use porchlight_session::CacheEntry;
use tracing::{debug, warn};

use crate::temporal;

/// Decides whether the cached artifacts of a session suffice to answer
/// the new turn, avoiding a fresh retrieval.
pub struct ReuseJudge {
    gateway: Arc<LlmGateway>,
}

impl ReuseJudge {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Judges the question against the session's cache entry.
    pub async fn should_reuse(
        &self,
        question: &str,
        recent_turns: &[Turn],
        entry: Option<&CacheEntry>,
    ) -> ReuseVerdict {
        let entry = match entry {
            Some(entry) if entry.has_artifacts() => entry,
            _ => return ReuseVerdict::Refresh(RefreshReason::NoHistory),
        };

        let digest = build_digest(entry);
        if temporal::anchors_shifted(question, &digest.render()) {
            debug!("temporal anchor shift, forcing refresh without model call");
            return ReuseVerdict::Refresh(RefreshReason::TemporalShift);
        }

        match self.gateway.plan_reuse(question, recent_turns, &digest).await {
            Ok(ReuseToken::Reuse) => ReuseVerdict::Reuse(ReuseReason::Judged),
            Ok(ReuseToken::Refresh) => ReuseVerdict::Refresh(RefreshReason::Judged),
            Err(e) => {
                warn!(error = %e, "reuse judgement unavailable, falling back to refresh");
                ReuseVerdict::Refresh(RefreshReason::ParseFallback)
            }
        }
    }
}

/// Projects a cache entry onto the compact digest shown to the model.
pub fn build_digest(entry: &CacheEntry) -> CachedDigest {
    let tables = entry
        .structured
        .as_ref()
        .map(|s| s.tables.clone())
        .unwrap_or_default();

    let mut sources = Vec::new();
    if let Some(unstructured) = &entry.unstructured {
        for chunk in &unstructured.chunks {
            if !sources.contains(&chunk.source) {
                sources.push(chunk.source.clone());
            }
        }
    }

    let last_mode = entry.last_mode.unwrap_or(
        match (entry.structured.is_some(), entry.unstructured.is_some()) {
            (true, true) => AnswerMode::Hybrid,
            (true, false) => AnswerMode::Structured,
            _ => AnswerMode::Unstructured,
        },
    );

    CachedDigest {
        last_mode,
        tables,
        sources,
        row_count: entry.structured.as_ref().map(|s| s.rows.len()).unwrap_or(0),
        chunk_count: entry
            .unstructured
            .as_ref()
            .map(|u| u.chunks.len())
            .unwrap_or(0),
        answer_summary: entry
            .last_answer
            .as_deref()
            .map(CachedDigest::summarise_answer)
            .unwrap_or_default(),
    }
}

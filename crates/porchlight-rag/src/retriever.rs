// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unstructured retriever: top-k similarity search with a distance
//! threshold, metadata normalisation, and answer-fragment composition.

use std::sync::Arc;

use porchlight_config::PorchlightConfig;
use porchlight_core::{DocChunk, PorchlightError, UnstructuredResult, VectorIndex};
use porchlight_llm::LlmGateway;
use thiserror::Error;
use tracing::debug;

/// Literal fragment returned when no chunk survives the threshold.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found.";

/// Substituted for a missing document identifier so downstream citation
/// is never null.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Failure taxonomy of unstructured retrieval.
#[derive(Debug, Error)]
pub enum UnstructuredFailure {
    /// The document index could not be reached or searched.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Embedding the question failed inside the index.
    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    /// Model contract violation while composing the answer fragment.
    #[error("model contract violation: {0}")]
    Contract(String),

    /// Model vendor unreachable; the turn downgrades.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl UnstructuredFailure {
    /// True for failures that must surface to the caller as internal
    /// failures instead of downgrading the turn.
    pub fn is_internal(&self) -> bool {
        matches!(self, UnstructuredFailure::Contract(_))
    }
}

/// Produces the top-k semantically-similar chunks with a grounded
/// answer fragment.
pub struct UnstructuredRetriever {
    gateway: Arc<LlmGateway>,
    index: Arc<dyn VectorIndex>,
    k_default: usize,
    k_max: usize,
    max_distance: f64,
}

impl UnstructuredRetriever {
    pub fn new(
        gateway: Arc<LlmGateway>,
        index: Arc<dyn VectorIndex>,
        config: &PorchlightConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            k_default: config.retrieval.k_default,
            k_max: config.retrieval.k_max,
            max_distance: config.retrieval.max_distance,
        }
    }

    /// Runs the full unstructured retrieval flow for one question.
    ///
    /// `k` defaults to the configured value and is clamped silently to
    /// `[1, k_max]`.
    pub async fn retrieve(
        &self,
        question: &str,
        k: Option<usize>,
    ) -> Result<UnstructuredResult, UnstructuredFailure> {
        let k = k.unwrap_or(self.k_default).clamp(1, self.k_max);

        let hits = self.index.search(question, k).await.map_err(|e| match e {
            PorchlightError::Embedding(message) => UnstructuredFailure::EmbeddingFailure(message),
            other => UnstructuredFailure::IndexUnavailable(other.to_string()),
        })?;

        // Order by ascending distance, drop anything past the threshold,
        // and normalise metadata so citation is never null.
        let mut surviving: Vec<_> = hits
            .into_iter()
            .filter(|hit| hit.distance <= self.max_distance)
            .collect();
        surviving.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        surviving.truncate(k);

        let chunks: Vec<DocChunk> = surviving
            .into_iter()
            .map(|hit| DocChunk {
                text: hit.text,
                source: hit
                    .source
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                doc_type: hit.doc_type,
            })
            .collect();

        if chunks.is_empty() {
            debug!("no chunk survived the distance threshold");
            return Ok(UnstructuredResult {
                chunks: vec![],
                answer_fragment: NO_RELEVANT_DOCUMENTS.to_string(),
            });
        }

        let answer_fragment = self
            .gateway
            .draft_rag_answer(question, &chunks)
            .await
            .map_err(|e| match e {
                PorchlightError::ModelContract { operation, detail } => {
                    UnstructuredFailure::Contract(format!("{operation}: {detail}"))
                }
                other => UnstructuredFailure::Unavailable(other.to_string()),
            })?;

        Ok(UnstructuredResult {
            chunks,
            answer_fragment,
        })
    }
}

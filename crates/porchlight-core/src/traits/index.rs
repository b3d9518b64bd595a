// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document index collaborator for semantic-similarity search.

use async_trait::async_trait;

use crate::error::PorchlightError;

/// One search hit: a chunk of document text with raw metadata and a
/// similarity distance (lower is more similar).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    /// Originating document identifier, when the index knows it.
    pub source: Option<String>,
    /// Document category, when the index knows it.
    pub doc_type: Option<String>,
    pub distance: f64,
}

/// Similarity search over unstructured community documents.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns up to `k` chunks ordered by ascending distance.
    async fn search(&self, question: &str, k: usize)
        -> Result<Vec<ScoredChunk>, PorchlightError>;
}

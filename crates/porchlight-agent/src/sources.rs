// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source extraction: projecting retrieval artifacts onto citations.
//!
//! Citations derive only from what the retrievers actually returned —
//! tables the executor reported, chunk metadata the index reported.
//! Structured citations come first (in consult order), then
//! unstructured (in chunk order), duplicates suppressed by identity
//! preserving first occurrence.

use std::collections::HashSet;

use porchlight_core::{
    AnswerMode, SourceCitation, StructuredResult, UnstructuredResult,
};
use porchlight_session::CacheEntry;

/// Builds the citation sequence for a reply from the turn's artifacts.
pub fn extract_sources(
    structured: Option<&StructuredResult>,
    unstructured: Option<&UnstructuredResult>,
) -> Vec<SourceCitation> {
    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    if let Some(structured) = structured {
        for table in &structured.tables {
            let citation = SourceCitation::Sql {
                table: table.clone(),
            };
            if seen.insert(citation.clone()) {
                sources.push(citation);
            }
        }
    }

    if let Some(unstructured) = unstructured {
        for chunk in &unstructured.chunks {
            let citation = SourceCitation::Rag {
                source: chunk.source.clone(),
                doc_type: chunk.doc_type.clone(),
            };
            if seen.insert(citation.clone()) {
                sources.push(citation);
            }
        }
    }

    sources
}

/// Citations for a history-only reply: the reused artifact's provenance,
/// gated by the mode that produced it so a stale other-side artifact is
/// never cited.
pub fn sources_for_entry(entry: &CacheEntry) -> Vec<SourceCitation> {
    match entry.last_mode {
        Some(AnswerMode::Structured) => extract_sources(entry.structured.as_ref(), None),
        Some(AnswerMode::Unstructured) => extract_sources(None, entry.unstructured.as_ref()),
        _ => extract_sources(entry.structured.as_ref(), entry.unstructured.as_ref()),
    }
}

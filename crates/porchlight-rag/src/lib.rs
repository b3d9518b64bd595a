// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unstructured retrieval for the Porchlight QA router.
//!
//! Given a natural-language question, returns the top-k
//! semantically-similar document chunks with per-chunk metadata and a
//! plain-language answer fragment grounded in them.

pub mod retriever;

pub use retriever::{
    UnstructuredFailure, UnstructuredRetriever, NO_RELEVANT_DOCUMENTS, UNKNOWN_SOURCE,
};

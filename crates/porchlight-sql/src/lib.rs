// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured retrieval for the Porchlight QA router.
//!
//! Given a natural-language question, drafts a single read-only query
//! against the civic-records schema, executes it, and composes a
//! grounded answer fragment. Drafting goes through the LLM gateway;
//! execution goes through the injected executor, which is the ground
//! truth for which tables were consulted.

pub mod guard;
pub mod retriever;

pub use retriever::{StructuredFailure, StructuredRetriever, NO_MATCHING_RECORDS};

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution pipeline for the Porchlight QA router.
//!
//! Ties the gateway, the reuse judge, the mode classifier, both
//! retrievers, and the session cache into the per-turn state machine:
//! load cache, judge reuse, classify, dispatch, merge, compose sources,
//! update cache, emit the envelope.

pub mod pipeline;
pub mod sources;

pub use pipeline::{ExecutionPipeline, EMPTY_QUESTION_ANSWER, RETRIEVAL_UNAVAILABLE};

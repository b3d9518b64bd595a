// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Porchlight QA router.
//!
//! This crate provides the shared types, the workspace error type, and
//! the collaborator trait definitions used throughout the Porchlight
//! workspace. Retrievers, the gateway, the session cache, and the
//! execution pipeline all build on what is defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PorchlightError;
pub use types::{
    AnswerMode, DocChunk, LlmRequest, LlmResponse, RefreshReason, ReplyEnvelope, ReuseReason,
    ReuseVerdict, Role, RoutingPlan, SessionId, SourceCitation, StructuredResult, Turn,
    UnstructuredResult,
};

pub use traits::{
    ColumnInfo, InteractionRecord, InteractionSink, LlmProvider, QueryOutput, SchemaCatalog,
    ScoredChunk, SqlExecutor, TableInfo, VectorIndex,
};

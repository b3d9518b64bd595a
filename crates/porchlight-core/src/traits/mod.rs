// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the Porchlight core.
//!
//! The core treats the LLM vendor, the schema metadata service, the
//! database executor, the document index, and the interaction log as
//! injected collaborators. Each trait here is the full contract the
//! core relies on; concrete implementations live in sibling crates
//! and in test utilities.

pub mod executor;
pub mod index;
pub mod log;
pub mod provider;
pub mod schema;

pub use executor::{QueryOutput, SqlExecutor};
pub use index::{ScoredChunk, VectorIndex};
pub use log::{InteractionRecord, InteractionSink};
pub use provider::LlmProvider;
pub use schema::{ColumnInfo, SchemaCatalog, TableInfo};

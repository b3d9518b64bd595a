// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Porchlight workspace.
//!
//! Provides mock implementations of the collaborator traits, enabling
//! fast, CI-runnable tests without external services: a scripted LLM
//! provider and counting stubs for the schema catalog, database
//! executor, document index, and interaction log.

pub mod mock_provider;
pub mod mock_retrieval;

pub use mock_provider::MockProvider;
pub use mock_retrieval::{MockExecutor, MockIndex, MockSchemaCatalog, MockSink};

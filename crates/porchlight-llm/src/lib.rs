// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM gateway for the Porchlight QA router.
//!
//! All model calls in the workspace go through [`LlmGateway`], which
//! enforces output-shape contracts so downstream components never see
//! free-form model text where a token or JSON field is expected.

pub mod digest;
pub mod gateway;
pub mod parse;
pub mod prompts;

pub use digest::CachedDigest;
pub use gateway::{LlmGateway, ReuseToken, Temperatures};

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait for LLM vendor integrations.

use async_trait::async_trait;

use crate::error::PorchlightError;
use crate::types::{LlmRequest, LlmResponse};

/// Adapter for an LLM vendor's text-generation API.
///
/// The gateway is the only caller; it supplies per-call temperature and
/// max-tokens and validates output shape itself. Implementations handle
/// transport, authentication, and transient-error retry only.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a completion request and returns the full response text.
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, PorchlightError>;
}

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider for the Porchlight QA router.
//!
//! This crate implements [`LlmProvider`] for the Anthropic Messages API.
//! The gateway crate layers prompt construction and output-shape
//! validation on top; this crate handles transport only.

pub mod client;
pub mod types;

use async_trait::async_trait;
use porchlight_config::PorchlightConfig;
use porchlight_core::{LlmProvider, LlmRequest, LlmResponse, PorchlightError};
use tracing::info;

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest, ResponseContentBlock};

/// Anthropic Claude provider implementing [`LlmProvider`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
    model_id: String,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &PorchlightConfig) -> Result<Self, PorchlightError> {
        let api_key = resolve_api_key(&config.llm.api_key)?;
        let client = AnthropicClient::new(api_key, config.llm.api_version.clone())?;

        info!(model = config.llm.model_id, "Anthropic provider initialized");

        Ok(Self {
            client,
            model_id: config.llm.model_id.clone(),
        })
    }

    /// Converts an [`LlmRequest`] to an Anthropic [`MessageRequest`].
    fn to_message_request(&self, request: &LlmRequest) -> MessageRequest {
        let messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .map(|turn| ApiMessage {
                role: turn.role.to_string(),
                content: turn.content.clone(),
            })
            .collect();

        MessageRequest {
            model: self.model_id.clone(),
            messages,
            system: request.system.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, PorchlightError> {
        let api_request = self.to_message_request(&request);
        let response = self.client.complete_message(&api_request).await?;

        // Join text content from response blocks.
        let text = response
            .content
            .iter()
            .map(|block| match block {
                ResponseContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse { text })
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, PorchlightError> {
    if let Some(key) = config_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        PorchlightError::Config(
            "Anthropic API key not found. Set llm.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

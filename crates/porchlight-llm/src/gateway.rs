// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The LLM gateway: single choke-point for all model calls.
//!
//! Each operation is a pure function of its prompt inputs with a strict
//! output schema: either one token from a closed set, or a JSON object
//! with a named string field. Output is validated here; on violation the
//! call is retried once with a tightened reminder, and a second violation
//! is reported as a model contract error. Other components treat the
//! model as a deterministic-shaped oracle and never parse its output
//! themselves.

use std::sync::Arc;

use porchlight_config::PorchlightConfig;
use porchlight_core::{
    DocChunk, LlmProvider, LlmRequest, PorchlightError, RoutingPlan, Turn,
};
use tracing::{debug, warn};

use crate::digest::CachedDigest;
use crate::parse::{extract_string_field, parse_closed_token};
use crate::prompts;

/// Token budget for closed-set token operations.
const TOKEN_OP_MAX_TOKENS: u32 = 16;

/// Token budget for query drafting.
const DRAFT_MAX_TOKENS: u32 = 768;

/// The reuse judge's two-token verdict surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseToken {
    Reuse,
    Refresh,
}

/// Per-operation sampling temperatures, each within [0.0, 0.3].
#[derive(Debug, Clone, Copy)]
pub struct Temperatures {
    pub route: f32,
    pub reuse: f32,
    pub draft: f32,
    pub answer: f32,
    pub merge: f32,
}

/// Single choke-point for all model calls.
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
    history_window: usize,
    temperatures: Temperatures,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &PorchlightConfig) -> Self {
        Self {
            provider,
            max_tokens: config.llm.max_tokens,
            history_window: config.retrieval.history_window,
            temperatures: Temperatures {
                route: config.llm.temperature_route,
                reuse: config.llm.temperature_reuse,
                draft: config.llm.temperature_draft,
                answer: config.llm.temperature_answer,
                merge: config.llm.temperature_merge,
            },
        }
    }

    /// Number of most-recent turns rendered into prompts.
    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Judges whether cached artifacts suffice for the question.
    pub async fn plan_reuse(
        &self,
        question: &str,
        history: &[Turn],
        digest: &CachedDigest,
    ) -> Result<ReuseToken, PorchlightError> {
        let history_text = prompts::render_history(history, self.history_window);
        let user = prompts::reuse_user(question, &history_text, &digest.render());
        let token = self
            .call_validated(
                "plan_reuse",
                prompts::REUSE_SYSTEM,
                user,
                self.temperatures.reuse,
                TOKEN_OP_MAX_TOKENS,
                "reply with exactly one word, REUSE or REFRESH, and nothing else",
                |text| parse_closed_token(text, &["REUSE", "REFRESH"]),
            )
            .await?;
        Ok(match token {
            "REUSE" => ReuseToken::Reuse,
            _ => ReuseToken::Refresh,
        })
    }

    /// Classifies the question into a routing plan.
    pub async fn classify_mode(
        &self,
        question: &str,
        history: &[Turn],
    ) -> Result<RoutingPlan, PorchlightError> {
        let history_text = prompts::render_history(history, self.history_window);
        let user = prompts::classify_user(question, &history_text);
        let token = self
            .call_validated(
                "classify_mode",
                prompts::CLASSIFY_SYSTEM,
                user,
                self.temperatures.route,
                TOKEN_OP_MAX_TOKENS,
                "reply with exactly one word: STRUCTURED, UNSTRUCTURED, HYBRID, or HISTORY",
                |text| {
                    parse_closed_token(text, &["STRUCTURED", "UNSTRUCTURED", "HYBRID", "HISTORY"])
                },
            )
            .await?;
        Ok(match token {
            "STRUCTURED" => RoutingPlan::Structured,
            "UNSTRUCTURED" => RoutingPlan::Unstructured,
            "HISTORY" => RoutingPlan::History,
            _ => RoutingPlan::Hybrid,
        })
    }

    /// Drafts a single read-only query against the rendered schema.
    pub async fn draft_query(
        &self,
        question: &str,
        schema_text: &str,
        history: &[Turn],
    ) -> Result<String, PorchlightError> {
        let history_text = prompts::render_history(history, self.history_window);
        let user = prompts::draft_user(question, schema_text, &history_text);
        self.call_validated(
            "draft_query",
            prompts::DRAFT_SYSTEM,
            user,
            self.temperatures.draft,
            DRAFT_MAX_TOKENS,
            "respond only as compact JSON of the form {\"query\": \"...\"}",
            |text| extract_string_field(text, "query"),
        )
        .await
    }

    /// Composes a plain-language fragment grounded in executed rows.
    pub async fn draft_sql_answer(
        &self,
        question: &str,
        columns: &[String],
        rows: &[Vec<serde_json::Value>],
        tables: &[String],
        truncated: bool,
    ) -> Result<String, PorchlightError> {
        let rows_json =
            serde_json::to_string(rows).map_err(|e| PorchlightError::Internal(e.to_string()))?;
        let user = prompts::sql_answer_user(question, columns, &rows_json, tables, truncated);
        self.call_validated(
            "draft_sql_answer",
            prompts::SQL_ANSWER_SYSTEM,
            user,
            self.temperatures.answer,
            self.max_tokens,
            "respond only as compact JSON of the form {\"answer\": \"...\"}",
            |text| extract_string_field(text, "answer"),
        )
        .await
    }

    /// Composes a plain-language fragment grounded in retrieved chunks.
    pub async fn draft_rag_answer(
        &self,
        question: &str,
        chunks: &[DocChunk],
    ) -> Result<String, PorchlightError> {
        let chunks_text = prompts::render_chunks(chunks);
        let user = prompts::rag_answer_user(question, &chunks_text);
        self.call_validated(
            "draft_rag_answer",
            prompts::RAG_ANSWER_SYSTEM,
            user,
            self.temperatures.answer,
            self.max_tokens,
            "respond only as compact JSON of the form {\"answer\": \"...\"}",
            |text| extract_string_field(text, "answer"),
        )
        .await
    }

    /// Merges the two fragments of a hybrid turn. Commutative on its
    /// inputs: the prompt receives both and is responsible for ordering.
    pub async fn merge_answers(
        &self,
        question: &str,
        sql_fragment: &str,
        rag_fragment: &str,
    ) -> Result<String, PorchlightError> {
        let user = prompts::merge_user(question, sql_fragment, rag_fragment);
        self.call_validated(
            "merge_answers",
            prompts::MERGE_SYSTEM,
            user,
            self.temperatures.merge,
            self.max_tokens,
            "respond only as compact JSON of the form {\"answer\": \"...\"}",
            |text| extract_string_field(text, "answer"),
        )
        .await
    }

    /// Answers a follow-up from conversation history alone.
    pub async fn answer_from_history(
        &self,
        question: &str,
        history: &[Turn],
        last_answer: Option<&str>,
    ) -> Result<String, PorchlightError> {
        let history_text = prompts::render_history(history, self.history_window);
        let user = prompts::history_user(
            question,
            &history_text,
            last_answer.unwrap_or("(no previous answer)"),
        );
        self.call_validated(
            "answer_from_history",
            prompts::HISTORY_SYSTEM,
            user,
            self.temperatures.answer,
            self.max_tokens,
            "respond only as compact JSON of the form {\"answer\": \"...\"}",
            |text| extract_string_field(text, "answer"),
        )
        .await
    }

    /// Calls the provider and validates output shape, retrying once with a
    /// tightened reminder appended to the user prompt.
    async fn call_validated<T>(
        &self,
        operation: &'static str,
        system: &str,
        user: String,
        temperature: f32,
        max_tokens: u32,
        reminder: &str,
        validate: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, PorchlightError> {
        let request = LlmRequest {
            system: Some(system.to_string()),
            messages: vec![Turn::user(user.clone())],
            max_tokens,
            temperature,
        };

        let response = self.provider.complete(request).await?;
        match validate(&response.text) {
            Ok(value) => {
                debug!(operation, "gateway operation succeeded");
                return Ok(value);
            }
            Err(reason) => {
                warn!(operation, reason, "output shape violation, retrying with reminder");
            }
        }

        let retry_request = LlmRequest {
            system: Some(system.to_string()),
            messages: vec![Turn::user(format!("{user}\n\nREMINDER: {reminder}."))],
            max_tokens,
            temperature,
        };

        let retry_response = self.provider.complete(retry_request).await?;
        validate(&retry_response.text).map_err(|reason| PorchlightError::ModelContract {
            operation: operation.to_string(),
            detail: reason,
        })
    }
}

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Porchlight QA router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Porchlight configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PorchlightConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM vendor settings and per-operation temperatures.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Retrieval limits shared by both retrievers.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session cache bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Execution pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Civic database and interaction log settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "porchlight".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LLM vendor configuration.
///
/// Temperatures are per gateway operation and must lie in [0.0, 0.3];
/// validation rejects anything outside that band.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API version header value.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model identifier passed through to the vendor.
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Upper bound on generated tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for mode classification.
    #[serde(default)]
    pub temperature_route: f32,

    /// Temperature for reuse judgement.
    #[serde(default)]
    pub temperature_reuse: f32,

    /// Temperature for query drafting.
    #[serde(default)]
    pub temperature_draft: f32,

    /// Temperature for answer-fragment composition.
    #[serde(default = "default_temperature_answer")]
    pub temperature_answer: f32,

    /// Temperature for hybrid answer merging.
    #[serde(default)]
    pub temperature_merge: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            model_id: default_model_id(),
            max_tokens: default_max_tokens(),
            temperature_route: 0.0,
            temperature_reuse: 0.0,
            temperature_draft: 0.0,
            temperature_answer: default_temperature_answer(),
            temperature_merge: 0.0,
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_model_id() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature_answer() -> f32 {
    0.2
}

/// Retrieval limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Default top-k for unstructured retrieval.
    #[serde(default = "default_k_default")]
    pub k_default: usize,

    /// Hard cap on top-k; larger requests are clamped silently.
    #[serde(default = "default_k_max")]
    pub k_max: usize,

    /// Row cap passed to the database executor.
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// Chunks with similarity distance above this are dropped
    /// (lower-is-more-similar scale).
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,

    /// Number of most-recent turns passed into LLM prompts.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k_default: default_k_default(),
            k_max: default_k_max(),
            row_limit: default_row_limit(),
            max_distance: default_max_distance(),
            history_window: default_history_window(),
        }
    }
}

fn default_k_default() -> usize {
    5
}

fn default_k_max() -> usize {
    10
}

fn default_row_limit() -> usize {
    500
}

fn default_max_distance() -> f64 {
    0.9
}

fn default_history_window() -> usize {
    10
}

/// Session cache bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Entries idle longer than this are evicted.
    #[serde(default = "default_idle_ttl_minutes")]
    pub idle_ttl_minutes: u64,

    /// Maximum number of cached sessions; least-recently-touched entries
    /// are evicted past this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: default_idle_ttl_minutes(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_idle_ttl_minutes() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    100
}

/// Execution pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Total per-turn deadline in seconds.
    #[serde(default = "default_turn_deadline_seconds")]
    pub turn_deadline_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            turn_deadline_seconds: default_turn_deadline_seconds(),
        }
    }
}

fn default_turn_deadline_seconds() -> u64 {
    30
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Accepted API keys. Empty disables API-key enforcement.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_keys: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

/// Storage configuration for the civic database, document index, and
/// interaction log (all share one SQLite file).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "porchlight.db".to_string()
}

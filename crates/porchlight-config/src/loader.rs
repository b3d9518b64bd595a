// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./porchlight.toml` > `~/.config/porchlight/porchlight.toml`
//! > `/etc/porchlight/porchlight.toml` with environment variable overrides
//! via `PORCHLIGHT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PorchlightConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/porchlight/porchlight.toml` (system-wide)
/// 3. `~/.config/porchlight/porchlight.toml` (user XDG config)
/// 4. `./porchlight.toml` (local directory)
/// 5. `PORCHLIGHT_*` environment variables
pub fn load_config() -> Result<PorchlightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PorchlightConfig::default()))
        .merge(Toml::file("/etc/porchlight/porchlight.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("porchlight/porchlight.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("porchlight.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PorchlightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PorchlightConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PorchlightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PorchlightConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PORCHLIGHT_LLM_MODEL_ID`
/// must map to `llm.model_id`, not `llm.model.id`.
fn env_provider() -> Env {
    Env::prefixed("PORCHLIGHT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PORCHLIGHT_LLM_API_KEY -> "llm_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("retrieval_", "retrieval.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

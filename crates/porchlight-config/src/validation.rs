// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup validation for loaded configuration.
//!
//! Figment catches type and key errors; this pass catches values that are
//! well-typed but out of range for the router's contracts.

use crate::model::PorchlightConfig;

/// Lowest and highest temperature any gateway operation may use.
const TEMPERATURE_RANGE: (f32, f32) = (0.0, 0.3);

/// Validate a loaded configuration, returning every problem found.
///
/// An empty vector means the configuration is usable.
pub fn validate(config: &PorchlightConfig) -> Vec<String> {
    let mut errors = Vec::new();

    for (name, value) in [
        ("llm.temperature_route", config.llm.temperature_route),
        ("llm.temperature_reuse", config.llm.temperature_reuse),
        ("llm.temperature_draft", config.llm.temperature_draft),
        ("llm.temperature_answer", config.llm.temperature_answer),
        ("llm.temperature_merge", config.llm.temperature_merge),
    ] {
        if !(TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&value) {
            errors.push(format!(
                "{name} must be within [{}, {}], got {value}",
                TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1
            ));
        }
    }

    if config.retrieval.k_default == 0 {
        errors.push("retrieval.k_default must be at least 1".to_string());
    }
    if config.retrieval.k_max == 0 {
        errors.push("retrieval.k_max must be at least 1".to_string());
    }
    if config.retrieval.k_default > config.retrieval.k_max {
        errors.push(format!(
            "retrieval.k_default ({}) must not exceed retrieval.k_max ({})",
            config.retrieval.k_default, config.retrieval.k_max
        ));
    }
    if config.retrieval.row_limit == 0 {
        errors.push("retrieval.row_limit must be at least 1".to_string());
    }
    if !(0.0..=2.0).contains(&config.retrieval.max_distance) {
        errors.push(format!(
            "retrieval.max_distance must be within [0.0, 2.0], got {}",
            config.retrieval.max_distance
        ));
    }
    if config.retrieval.history_window == 0 {
        errors.push("retrieval.history_window must be at least 1".to_string());
    }

    if config.cache.max_sessions == 0 {
        errors.push("cache.max_sessions must be at least 1".to_string());
    }
    if config.cache.idle_ttl_minutes == 0 {
        errors.push("cache.idle_ttl_minutes must be at least 1".to_string());
    }

    if config.pipeline.turn_deadline_seconds == 0 {
        errors.push("pipeline.turn_deadline_seconds must be at least 1".to_string());
    }

    if config.llm.max_tokens == 0 {
        errors.push("llm.max_tokens must be at least 1".to_string());
    }

    errors
}

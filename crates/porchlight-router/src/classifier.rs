// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mode classifier: turns a question into a routing plan.
//!
//! The classifier only produces a plan; it never invokes a retriever.
//! When the gateway cannot produce a usable token, the tie-break is
//! `Hybrid`, the safest superset, and never `History`.

use std::sync::Arc;

use porchlight_core::{RoutingPlan, Turn};
use porchlight_llm::LlmGateway;
use tracing::{debug, warn};

/// Classifies a turn into one of the four routing plans.
pub struct ModeClassifier {
    gateway: Arc<LlmGateway>,
}

impl ModeClassifier {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Produces a routing plan for the question.
    pub async fn classify(&self, question: &str, recent_turns: &[Turn]) -> RoutingPlan {
        match self.gateway.classify_mode(question, recent_turns).await {
            Ok(plan) => {
                debug!(plan = %plan, "question classified");
                plan
            }
            Err(e) => {
                warn!(error = %e, "classification unavailable, defaulting to hybrid");
                RoutingPlan::Hybrid
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porchlight_config::PorchlightConfig;
    use porchlight_test_utils::MockProvider;

    fn classifier(provider: Arc<MockProvider>) -> ModeClassifier {
        let gateway = Arc::new(LlmGateway::new(provider, &PorchlightConfig::default()));
        ModeClassifier::new(gateway)
    }

    #[tokio::test]
    async fn classifies_each_token() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "STRUCTURED",
            "UNSTRUCTURED",
            "HYBRID",
            "HISTORY",
        ]));
        let classifier = classifier(provider);
        assert_eq!(
            classifier.classify("How many reports?", &[]).await,
            RoutingPlan::Structured
        );
        assert_eq!(
            classifier.classify("What do residents say?", &[]).await,
            RoutingPlan::Unstructured
        );
        assert_eq!(
            classifier.classify("Numbers and context?", &[]).await,
            RoutingPlan::Hybrid
        );
        assert_eq!(
            classifier.classify("Summarise that.", &[]).await,
            RoutingPlan::History
        );
    }

    #[tokio::test]
    async fn unparsable_output_defaults_to_hybrid() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "this is clearly a history question",
            "HISTORY!!! definitely",
        ]));
        let classifier = classifier(provider.clone());
        let plan = classifier.classify("q", &[]).await;
        assert_eq!(plan, RoutingPlan::Hybrid);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn provider_outage_defaults_to_hybrid() {
        let provider = Arc::new(MockProvider::new());
        provider.push_error("outage").await;
        let classifier = classifier(provider);
        assert_eq!(classifier.classify("q", &[]).await, RoutingPlan::Hybrid);
    }
}

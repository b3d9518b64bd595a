// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structured retriever: schema consult, query drafting, guarded
//! execution, and answer-fragment composition.

use std::sync::Arc;

use porchlight_config::PorchlightConfig;
use porchlight_core::{
    PorchlightError, SchemaCatalog, SqlExecutor, StructuredResult, Turn,
};
use porchlight_llm::LlmGateway;
use thiserror::Error;
use tracing::{debug, error};

use crate::guard;

/// Literal fragment returned when a query executes but matches nothing.
pub const NO_MATCHING_RECORDS: &str = "No matching records found.";

/// Failure taxonomy of structured retrieval.
#[derive(Debug, Error)]
pub enum StructuredFailure {
    /// The schema catalog offered no plausible table; upstream may fall
    /// back to unstructured retrieval.
    #[error("schema miss: no plausible table for the question")]
    SchemaMiss,

    /// The gateway could not produce a parsable query after retry.
    #[error("query draft invalid: {0}")]
    DraftInvalid(String),

    /// Executor-side problem; the turn downgrades.
    #[error("executor error: {0}")]
    ExecutorError(String),

    /// The drafted query was not read-only. The offending draft is
    /// logged for audit before this is returned.
    #[error("non-read-only query rejected")]
    NonReadOnlyQuery { sql: String },

    /// Model contract violation while composing the answer fragment.
    #[error("model contract violation: {0}")]
    Contract(String),

    /// Model vendor unreachable; the turn downgrades.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl StructuredFailure {
    /// True for failures that must surface to the caller as internal
    /// failures instead of downgrading the turn.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            StructuredFailure::DraftInvalid(_)
                | StructuredFailure::NonReadOnlyQuery { .. }
                | StructuredFailure::Contract(_)
        )
    }
}

/// Produces executed query results with a grounded answer fragment.
pub struct StructuredRetriever {
    gateway: Arc<LlmGateway>,
    catalog: Arc<dyn SchemaCatalog>,
    executor: Arc<dyn SqlExecutor>,
    row_limit: usize,
}

impl StructuredRetriever {
    pub fn new(
        gateway: Arc<LlmGateway>,
        catalog: Arc<dyn SchemaCatalog>,
        executor: Arc<dyn SqlExecutor>,
        config: &PorchlightConfig,
    ) -> Self {
        Self {
            gateway,
            catalog,
            executor,
            row_limit: config.retrieval.row_limit,
        }
    }

    /// Runs the full structured retrieval flow for one question.
    pub async fn retrieve(
        &self,
        question: &str,
        recent_turns: &[Turn],
    ) -> Result<StructuredResult, StructuredFailure> {
        // (a) Consult the schema catalog for plausible tables.
        let hints = self
            .catalog
            .keyword_hint(question)
            .await
            .map_err(|e| StructuredFailure::Unavailable(e.to_string()))?;
        if hints.is_empty() {
            return Err(StructuredFailure::SchemaMiss);
        }

        let tables = self
            .catalog
            .list_tables()
            .await
            .map_err(|e| StructuredFailure::Unavailable(e.to_string()))?;
        let schema_text: String = tables
            .iter()
            .filter(|table| hints.contains(&table.name))
            .map(|table| table.render())
            .collect::<Vec<_>>()
            .join("\n");
        if schema_text.is_empty() {
            return Err(StructuredFailure::SchemaMiss);
        }

        // (b) Draft one read-only query.
        let sql = self
            .gateway
            .draft_query(question, &schema_text, recent_turns)
            .await
            .map_err(|e| match e {
                PorchlightError::ModelContract { operation, detail } => {
                    StructuredFailure::DraftInvalid(format!("{operation}: {detail}"))
                }
                other => StructuredFailure::Unavailable(other.to_string()),
            })?;

        // (c) Reject anything that is not a single read-only statement.
        if let Err(reason) = guard::ensure_read_only(&sql) {
            error!(draft = %sql, reason, "non-read-only draft rejected");
            return Err(StructuredFailure::NonReadOnlyQuery { sql });
        }

        // (d) Execute against the civic database.
        let output = self
            .executor
            .execute_readonly(&sql, self.row_limit)
            .await
            .map_err(|e| StructuredFailure::ExecutorError(e.to_string()))?;

        let consulted = dedup_preserve(output.tables_referenced);

        if output.rows.is_empty() {
            debug!(sql = %sql, "query matched no records");
            return Ok(StructuredResult {
                columns: output.columns,
                rows: vec![],
                tables: consulted,
                answer_fragment: NO_MATCHING_RECORDS.to_string(),
                sql_text: sql,
                truncated: false,
            });
        }

        // The executor is the ground truth for consulted tables.
        if consulted.is_empty() {
            return Err(StructuredFailure::ExecutorError(
                "executor reported rows without referenced tables".to_string(),
            ));
        }

        // Row cap: never hand more than row_limit rows to composition.
        let mut rows = output.rows;
        rows.truncate(self.row_limit);

        // (e) Compose the answer fragment grounded in the rows.
        let mut answer_fragment = self
            .gateway
            .draft_sql_answer(question, &output.columns, &rows, &consulted, output.truncated)
            .await
            .map_err(|e| match e {
                PorchlightError::ModelContract { operation, detail } => {
                    StructuredFailure::Contract(format!("{operation}: {detail}"))
                }
                other => StructuredFailure::Unavailable(other.to_string()),
            })?;

        if output.truncated {
            answer_fragment.push_str(&format!(
                " (Showing the first {} matching records; the full result was truncated.)",
                self.row_limit
            ));
        }

        Ok(StructuredResult {
            columns: output.columns,
            rows,
            tables: consulted,
            answer_fragment,
            sql_text: sql,
            truncated: output.truncated,
        })
    }
}

/// First-occurrence dedup that keeps consult order.
fn dedup_preserve(tables: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tables.len());
    for table in tables {
        if !seen.contains(&table) {
            seen.push(table);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use porchlight_core::QueryOutput;
    use porchlight_test_utils::{MockExecutor, MockProvider, MockSchemaCatalog};

    struct Fixture {
        provider: Arc<MockProvider>,
        executor: Arc<MockExecutor>,
        retriever: StructuredRetriever,
    }

    fn fixture(tables: &[&str]) -> Fixture {
        let provider = Arc::new(MockProvider::new());
        let executor = Arc::new(MockExecutor::new());
        let catalog = Arc::new(MockSchemaCatalog::with_tables(tables));
        let gateway = Arc::new(LlmGateway::new(
            provider.clone(),
            &PorchlightConfig::default(),
        ));
        let retriever = StructuredRetriever::new(
            gateway,
            catalog,
            executor.clone(),
            &PorchlightConfig::default(),
        );
        Fixture {
            provider,
            executor,
            retriever,
        }
    }

    #[tokio::test]
    async fn happy_path_composes_grounded_result() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT COUNT(*) AS total FROM incident_reports"}"#)
            .await;
        f.provider
            .push_response(r#"{"answer": "There were 42 incident reports."}"#)
            .await;
        f.executor
            .push_output(MockExecutor::count_output("incident_reports", 42))
            .await;

        let result = f
            .retriever
            .retrieve("How many incident_reports in November 2024?", &[])
            .await
            .unwrap();

        assert_eq!(result.tables, vec!["incident_reports"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.answer_fragment, "There were 42 incident reports.");
        assert!(result.sql_text.starts_with("SELECT"));
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn schema_miss_when_no_table_is_plausible() {
        let f = fixture(&["incident_reports"]);
        let result = f.retriever.retrieve("What is the meaning of life?", &[]).await;
        assert!(matches!(result, Err(StructuredFailure::SchemaMiss)));
        // Neither the model nor the executor was consulted.
        assert_eq!(f.provider.call_count(), 0);
        assert_eq!(f.executor.call_count(), 0);
    }

    #[tokio::test]
    async fn draft_invalid_after_retry() {
        let f = fixture(&["incident_reports"]);
        f.provider.push_response("not json at all").await;
        f.provider.push_response("still not json").await;

        let result = f.retriever.retrieve("count incident_reports", &[]).await;
        assert!(matches!(result, Err(StructuredFailure::DraftInvalid(_))));
        assert_eq!(f.executor.call_count(), 0);
    }

    #[tokio::test]
    async fn non_read_only_draft_rejected_before_execution() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "DELETE FROM incident_reports"}"#)
            .await;

        let result = f.retriever.retrieve("count incident_reports", &[]).await;
        match result {
            Err(StructuredFailure::NonReadOnlyQuery { sql }) => {
                assert!(sql.contains("DELETE"));
            }
            other => panic!("expected NonReadOnlyQuery, got {other:?}"),
        }
        assert_eq!(f.executor.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_rows_returns_literal_fragment_without_composition() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT * FROM incident_reports WHERE 0"}"#)
            .await;
        f.executor
            .push_output(QueryOutput {
                columns: vec!["id".into()],
                rows: vec![],
                tables_referenced: vec!["incident_reports".into()],
                truncated: false,
            })
            .await;

        let result = f
            .retriever
            .retrieve("count incident_reports", &[])
            .await
            .unwrap();
        assert_eq!(result.answer_fragment, NO_MATCHING_RECORDS);
        assert!(result.rows.is_empty());
        // Only the draft call reached the model; composition was skipped.
        assert_eq!(f.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn executor_error_downgrades() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT 1 FROM incident_reports"}"#)
            .await;
        f.executor.push_error("connection refused").await;

        let result = f.retriever.retrieve("count incident_reports", &[]).await;
        match result {
            Err(failure @ StructuredFailure::ExecutorError(_)) => {
                assert!(!failure.is_internal());
            }
            other => panic!("expected ExecutorError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_result_states_truncation() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT id FROM incident_reports"}"#)
            .await;
        f.provider
            .push_response(r#"{"answer": "Here are the incidents."}"#)
            .await;
        f.executor
            .push_output(QueryOutput {
                columns: vec!["id".into()],
                rows: (0..500).map(|i| vec![serde_json::json!(i)]).collect(),
                tables_referenced: vec!["incident_reports".into()],
                truncated: true,
            })
            .await;

        let result = f
            .retriever
            .retrieve("list incident_reports", &[])
            .await
            .unwrap();
        assert!(result.truncated);
        assert!(result.answer_fragment.contains("truncated"));
    }

    #[tokio::test]
    async fn untruncated_full_limit_makes_no_truncation_claim() {
        // Exactly row_limit rows with truncated = false: no claim.
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT id FROM incident_reports"}"#)
            .await;
        f.provider
            .push_response(r#"{"answer": "Here are all 500 incidents."}"#)
            .await;
        f.executor
            .push_output(QueryOutput {
                columns: vec!["id".into()],
                rows: (0..500).map(|i| vec![serde_json::json!(i)]).collect(),
                tables_referenced: vec!["incident_reports".into()],
                truncated: false,
            })
            .await;

        let result = f
            .retriever
            .retrieve("list incident_reports", &[])
            .await
            .unwrap();
        assert!(!result.truncated);
        assert!(!result.answer_fragment.contains("truncated"));
    }

    #[tokio::test]
    async fn consulted_tables_deduped_preserving_order() {
        let f = fixture(&["incident_reports"]);
        f.provider
            .push_response(r#"{"query": "SELECT 1 FROM incident_reports JOIN weekly_events"}"#)
            .await;
        f.provider
            .push_response(r#"{"answer": "Joined view."}"#)
            .await;
        f.executor
            .push_output(QueryOutput {
                columns: vec!["n".into()],
                rows: vec![vec![serde_json::json!(1)]],
                tables_referenced: vec![
                    "incident_reports".into(),
                    "weekly_events".into(),
                    "incident_reports".into(),
                ],
                truncated: false,
            })
            .await;

        let result = f
            .retriever
            .retrieve("incident_reports and events", &[])
            .await
            .unwrap();
        assert_eq!(result.tables, vec!["incident_reports", "weekly_events"]);
    }

    #[test]
    fn internal_failure_classification() {
        assert!(StructuredFailure::DraftInvalid("x".into()).is_internal());
        assert!(StructuredFailure::NonReadOnlyQuery { sql: "x".into() }.is_internal());
        assert!(StructuredFailure::Contract("x".into()).is_internal());
        assert!(!StructuredFailure::SchemaMiss.is_internal());
        assert!(!StructuredFailure::ExecutorError("x".into()).is_internal());
        assert!(!StructuredFailure::Unavailable("x".into()).is_internal());
    }
}

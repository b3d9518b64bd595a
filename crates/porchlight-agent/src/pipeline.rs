// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The execution pipeline: per-turn orchestration.
//!
//! One logical task per incoming turn: load the cache, judge reuse,
//! classify, dispatch to the retrievers (both concurrently for hybrid),
//! compose sources, update the cache, and emit the envelope. Turns
//! within a session are serialised by a per-session mutex; each turn
//! runs under a total deadline, and the cache is only written after a
//! successful retrieval, so a timed-out or failed turn leaves the
//! session's artifacts exactly as they were.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use porchlight_config::PorchlightConfig;
use porchlight_core::{
    AnswerMode, InteractionRecord, InteractionSink, PorchlightError, ReplyEnvelope, RoutingPlan,
    SchemaCatalog, Turn,
};
use porchlight_llm::LlmGateway;
use porchlight_rag::{UnstructuredFailure, UnstructuredRetriever};
use porchlight_router::{ModeClassifier, ReuseJudge};
use porchlight_session::{CacheEntry, CacheUpdate, SessionCache};
use porchlight_sql::{StructuredFailure, StructuredRetriever};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::sources;

/// Reply for a blank or whitespace-only question.
pub const EMPTY_QUESTION_ANSWER: &str = "Please enter a question.";

/// Reply when retrieval fails and no side survives.
pub const RETRIEVAL_UNAVAILABLE: &str = "Unable to retrieve information at this time.";

/// Top-level orchestrator for one conversational interface.
pub struct ExecutionPipeline {
    gateway: Arc<LlmGateway>,
    judge: ReuseJudge,
    classifier: ModeClassifier,
    structured: StructuredRetriever,
    unstructured: UnstructuredRetriever,
    cache: Arc<SessionCache>,
    catalog: Arc<dyn SchemaCatalog>,
    sink: Option<Arc<dyn InteractionSink>>,
    turn_deadline: Duration,
    turn_guards: DashMap<String, Arc<Mutex<()>>>,
}

impl ExecutionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<LlmGateway>,
        structured: StructuredRetriever,
        unstructured: UnstructuredRetriever,
        cache: Arc<SessionCache>,
        catalog: Arc<dyn SchemaCatalog>,
        sink: Option<Arc<dyn InteractionSink>>,
        config: &PorchlightConfig,
    ) -> Self {
        Self {
            judge: ReuseJudge::new(gateway.clone()),
            classifier: ModeClassifier::new(gateway.clone()),
            gateway,
            structured,
            unstructured,
            cache,
            catalog,
            sink,
            turn_deadline: Duration::from_secs(config.pipeline.turn_deadline_seconds),
            turn_guards: DashMap::new(),
        }
    }

    /// Handles one turn end-to-end and returns the reply envelope.
    ///
    /// Only model contract violations and non-read-only drafts surface
    /// as errors; every retrieval-side problem is recovered into a
    /// well-formed envelope.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        question: &str,
        history: &[Turn],
    ) -> Result<ReplyEnvelope, PorchlightError> {
        if question.trim().is_empty() {
            return Ok(ReplyEnvelope {
                answer: EMPTY_QUESTION_ANSWER.to_string(),
                sources: vec![],
                mode: AnswerMode::History,
            });
        }

        // Serialise turns within a session; sessions run independently.
        let guard = self.turn_guard(session_id);
        let _turn = guard.lock().await;

        let attempted = Arc::new(std::sync::Mutex::new(AnswerMode::Hybrid));
        let outcome = tokio::time::timeout(
            self.turn_deadline,
            self.run_turn(session_id, question, history, &attempted),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                let mode = *attempted.lock().unwrap_or_else(|e| e.into_inner());
                warn!(
                    session_id,
                    deadline_secs = self.turn_deadline.as_secs(),
                    "turn deadline exceeded, cache left untouched"
                );
                Ok(ReplyEnvelope {
                    answer: RETRIEVAL_UNAVAILABLE.to_string(),
                    sources: vec![],
                    mode,
                })
            }
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        question: &str,
        history: &[Turn],
        attempted: &std::sync::Mutex<AnswerMode>,
    ) -> Result<ReplyEnvelope, PorchlightError> {
        self.cache.sweep().await;
        let entry = self.cache.get(session_id).await;

        let verdict = self.judge.should_reuse(question, history, entry.as_ref()).await;
        debug!(session_id, ?verdict, "reuse verdict");

        if verdict.is_reuse() {
            if let Some(entry) = entry.as_ref() {
                set_attempted(attempted, AnswerMode::History);
                let envelope = self.answer_from_cache(question, history, entry).await?;
                self.log_turn(session_id, question, &envelope);
                return Ok(envelope);
            }
        }

        let plan = self.classifier.classify(question, history).await;
        let plan = match plan {
            RoutingPlan::History => match entry.as_ref().filter(|e| e.has_artifacts()) {
                Some(entry) => {
                    set_attempted(attempted, AnswerMode::History);
                    let envelope = self.answer_from_cache(question, history, entry).await?;
                    self.log_turn(session_id, question, &envelope);
                    return Ok(envelope);
                }
                None => {
                    debug!("history plan with cold cache, demoting to hybrid");
                    RoutingPlan::Hybrid
                }
            },
            other => other,
        };

        let envelope = match plan {
            RoutingPlan::Structured => {
                set_attempted(attempted, AnswerMode::Structured);
                self.run_structured(session_id, question, history, attempted).await?
            }
            RoutingPlan::Unstructured => {
                set_attempted(attempted, AnswerMode::Unstructured);
                self.run_unstructured(session_id, question, history, attempted).await?
            }
            RoutingPlan::Hybrid | RoutingPlan::History => {
                set_attempted(attempted, AnswerMode::Hybrid);
                self.run_hybrid(session_id, question, history).await?
            }
        };

        self.log_turn(session_id, question, &envelope);
        Ok(envelope)
    }

    /// Structured-only dispatch. A schema miss promotes silently to
    /// unstructured retrieval.
    async fn run_structured(
        &self,
        session_id: &str,
        question: &str,
        history: &[Turn],
        attempted: &std::sync::Mutex<AnswerMode>,
    ) -> Result<ReplyEnvelope, PorchlightError> {
        match self.structured.retrieve(question, history).await {
            Ok(result) => {
                let citations = sources::extract_sources(Some(&result), None);
                let answer = result.answer_fragment.clone();
                self.cache
                    .put(
                        session_id,
                        CacheUpdate {
                            structured: Some(result),
                            last_answer: Some(answer.clone()),
                            last_mode: Some(AnswerMode::Structured),
                            ..Default::default()
                        },
                    )
                    .await;
                Ok(ReplyEnvelope {
                    answer,
                    sources: citations,
                    mode: AnswerMode::Structured,
                })
            }
            Err(StructuredFailure::SchemaMiss) => {
                info!(session_id, "schema miss, promoting to unstructured retrieval");
                set_attempted(attempted, AnswerMode::Unstructured);
                self.run_unstructured(session_id, question, history, attempted).await
            }
            Err(failure) if failure.is_internal() => Err(map_structured_internal(failure)),
            Err(failure) => {
                warn!(session_id, error = %failure, "structured retrieval failed, downgrading");
                Ok(downgraded(AnswerMode::Structured))
            }
        }
    }

    /// Unstructured-only dispatch. Zero surviving chunks promote to
    /// hybrid for one retry when the question mentions identifiers the
    /// schema catalog recognises.
    async fn run_unstructured(
        &self,
        session_id: &str,
        question: &str,
        history: &[Turn],
        attempted: &std::sync::Mutex<AnswerMode>,
    ) -> Result<ReplyEnvelope, PorchlightError> {
        match self.unstructured.retrieve(question, None).await {
            Ok(result) => {
                if result.chunks.is_empty() {
                    let hints = self
                        .catalog
                        .keyword_hint(question)
                        .await
                        .unwrap_or_default();
                    if !hints.is_empty() {
                        info!(
                            session_id,
                            "no chunks but structured keywords present, promoting to hybrid"
                        );
                        set_attempted(attempted, AnswerMode::Hybrid);
                        return self.run_hybrid(session_id, question, history).await;
                    }
                }

                let citations = sources::extract_sources(None, Some(&result));
                let answer = result.answer_fragment.clone();
                self.cache
                    .put(
                        session_id,
                        CacheUpdate {
                            unstructured: Some(result),
                            last_answer: Some(answer.clone()),
                            last_mode: Some(AnswerMode::Unstructured),
                            ..Default::default()
                        },
                    )
                    .await;
                Ok(ReplyEnvelope {
                    answer,
                    sources: citations,
                    mode: AnswerMode::Unstructured,
                })
            }
            Err(failure) if failure.is_internal() => Err(map_unstructured_internal(failure)),
            Err(failure) => {
                warn!(session_id, error = %failure, "unstructured retrieval failed, downgrading");
                Ok(downgraded(AnswerMode::Unstructured))
            }
        }
    }

    /// Hybrid dispatch: both retrievers run concurrently and join before
    /// the merge. When one side fails with a retrieval-class error, the
    /// other side's fragment is used unchanged and the envelope reports
    /// the mode that actually contributed content.
    async fn run_hybrid(
        &self,
        session_id: &str,
        question: &str,
        history: &[Turn],
    ) -> Result<ReplyEnvelope, PorchlightError> {
        let (structured_side, unstructured_side) = tokio::join!(
            self.structured.retrieve(question, history),
            self.unstructured.retrieve(question, None),
        );

        // Internal failures abort the turn regardless of the other side.
        let structured_side = match structured_side {
            Err(failure) if failure.is_internal() => {
                return Err(map_structured_internal(failure))
            }
            other => other,
        };
        let unstructured_side = match unstructured_side {
            Err(failure) if failure.is_internal() => {
                return Err(map_unstructured_internal(failure))
            }
            other => other,
        };

        match (structured_side, unstructured_side) {
            (Ok(s), Ok(u)) => {
                let answer = match self
                    .gateway
                    .merge_answers(question, &s.answer_fragment, &u.answer_fragment)
                    .await
                {
                    Ok(merged) => merged,
                    Err(e) if e.is_internal_failure() => return Err(e),
                    Err(e) => {
                        warn!(error = %e, "merge unavailable, concatenating fragments");
                        format!("{}\n\n{}", s.answer_fragment, u.answer_fragment)
                    }
                };

                let citations = sources::extract_sources(Some(&s), Some(&u));
                self.cache
                    .put(
                        session_id,
                        CacheUpdate {
                            structured: Some(s),
                            unstructured: Some(u),
                            last_answer: Some(answer.clone()),
                            last_mode: Some(AnswerMode::Hybrid),
                            ..Default::default()
                        },
                    )
                    .await;
                Ok(ReplyEnvelope {
                    answer,
                    sources: citations,
                    mode: AnswerMode::Hybrid,
                })
            }
            (Ok(s), Err(failure)) => {
                warn!(session_id, error = %failure, "unstructured side failed, structured survives");
                let citations = sources::extract_sources(Some(&s), None);
                let answer = s.answer_fragment.clone();
                self.cache
                    .put(
                        session_id,
                        CacheUpdate {
                            structured: Some(s),
                            last_answer: Some(answer.clone()),
                            last_mode: Some(AnswerMode::Structured),
                            ..Default::default()
                        },
                    )
                    .await;
                Ok(ReplyEnvelope {
                    answer,
                    sources: citations,
                    mode: AnswerMode::Structured,
                })
            }
            (Err(failure), Ok(u)) => {
                warn!(session_id, error = %failure, "structured side failed, unstructured survives");
                let citations = sources::extract_sources(None, Some(&u));
                let answer = u.answer_fragment.clone();
                self.cache
                    .put(
                        session_id,
                        CacheUpdate {
                            unstructured: Some(u),
                            last_answer: Some(answer.clone()),
                            last_mode: Some(AnswerMode::Unstructured),
                            ..Default::default()
                        },
                    )
                    .await;
                Ok(ReplyEnvelope {
                    answer,
                    sources: citations,
                    mode: AnswerMode::Unstructured,
                })
            }
            (Err(s_failure), Err(u_failure)) => {
                warn!(
                    session_id,
                    structured_error = %s_failure,
                    unstructured_error = %u_failure,
                    "both retrieval sides failed, downgrading"
                );
                Ok(downgraded(AnswerMode::Hybrid))
            }
        }
    }

    /// History-only answer: no retriever is invoked; sources reflect
    /// the reused artifact's provenance; the cache is only touched.
    async fn answer_from_cache(
        &self,
        question: &str,
        history: &[Turn],
        entry: &CacheEntry,
    ) -> Result<ReplyEnvelope, PorchlightError> {
        let answer = match self
            .gateway
            .answer_from_history(question, history, entry.last_answer.as_deref())
            .await
        {
            Ok(answer) => answer,
            Err(e) if e.is_internal_failure() => return Err(e),
            Err(e) => {
                warn!(error = %e, "history answer unavailable, downgrading");
                return Ok(downgraded(AnswerMode::History));
            }
        };

        Ok(ReplyEnvelope {
            answer,
            sources: sources::sources_for_entry(entry),
            mode: AnswerMode::History,
        })
    }

    /// Fire-and-forget interaction logging; failures never affect the reply.
    fn log_turn(&self, session_id: &str, question: &str, envelope: &ReplyEnvelope) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let record = InteractionRecord {
            session_id: session_id.to_string(),
            question: question.to_string(),
            answer: envelope.answer.clone(),
            mode: envelope.mode.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        tokio::spawn(async move {
            if let Err(e) = sink.record(&record).await {
                warn!(error = %e, "interaction log write failed");
            }
        });
    }

    fn turn_guard(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.turn_guards
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn set_attempted(attempted: &std::sync::Mutex<AnswerMode>, mode: AnswerMode) {
    *attempted.lock().unwrap_or_else(|e| e.into_inner()) = mode;
}

fn downgraded(mode: AnswerMode) -> ReplyEnvelope {
    ReplyEnvelope {
        answer: RETRIEVAL_UNAVAILABLE.to_string(),
        sources: vec![],
        mode,
    }
}

fn map_structured_internal(failure: StructuredFailure) -> PorchlightError {
    match failure {
        StructuredFailure::NonReadOnlyQuery { sql } => PorchlightError::NonReadOnlyQuery { sql },
        StructuredFailure::DraftInvalid(detail) => PorchlightError::ModelContract {
            operation: "draft_query".to_string(),
            detail,
        },
        StructuredFailure::Contract(detail) => PorchlightError::ModelContract {
            operation: "draft_sql_answer".to_string(),
            detail,
        },
        other => PorchlightError::Internal(other.to_string()),
    }
}

fn map_unstructured_internal(failure: UnstructuredFailure) -> PorchlightError {
    match failure {
        UnstructuredFailure::Contract(detail) => PorchlightError::ModelContract {
            operation: "draft_rag_answer".to_string(),
            detail,
        },
        other => PorchlightError::Internal(other.to_string()),
    }
}

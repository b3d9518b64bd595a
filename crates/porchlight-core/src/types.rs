// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Porchlight workspace.

use serde::{Deserialize, Serialize};

/// Unique identifier for a conversation session. Opaque to the core;
/// chosen by the surrounding HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn. The core reads an externally-supplied
/// history of turns; it does not own conversation persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The mode classifier's decision on which retrieval path(s) to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPlan {
    /// Answer from the relational store via a drafted read-only query.
    Structured,
    /// Answer from the document index via semantic similarity.
    Unstructured,
    /// Run both retrievers and merge their fragments.
    Hybrid,
    /// Answer from cached prior-turn artifacts without new retrieval.
    History,
}

impl std::fmt::Display for RoutingPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingPlan::Structured => write!(f, "structured"),
            RoutingPlan::Unstructured => write!(f, "unstructured"),
            RoutingPlan::Hybrid => write!(f, "hybrid"),
            RoutingPlan::History => write!(f, "history"),
        }
    }
}

/// Why the reuse judge decided the cached artifacts suffice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseReason {
    /// The model judged the question a follow-up answerable from the digest.
    Judged,
}

/// Why the reuse judge demanded fresh retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// No prior retrieval artifacts exist for the session.
    NoHistory,
    /// The question carries a temporal anchor absent from the cached digest.
    TemporalShift,
    /// The model's verdict was not one of the two literal tokens.
    ParseFallback,
    /// The model judged the question to need new data.
    Judged,
}

/// The reuse judge's decision on whether the prior turn's retrieved data
/// can answer the new turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseVerdict {
    Reuse(ReuseReason),
    Refresh(RefreshReason),
}

impl ReuseVerdict {
    pub fn is_reuse(&self) -> bool {
        matches!(self, ReuseVerdict::Reuse(_))
    }
}

/// Executed structured-retrieval output.
///
/// Invariants: every row has exactly `columns.len()` values; `tables` is
/// non-empty whenever `rows` is non-empty and preserves consult order with
/// first-occurrence dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row tuples, each with arity `columns.len()`.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Tables the executor actually consulted, in consult order.
    pub tables: Vec<String>,
    /// Plain-language answer fragment grounded in the rows.
    pub answer_fragment: String,
    /// The executed query text. Diagnostic only; never cited.
    pub sql_text: String,
    /// Whether the executor reported the row set as truncated.
    pub truncated: bool,
}

/// A document chunk that survived retrieval, with normalised metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocChunk {
    pub text: String,
    /// Originating document identifier. Never empty: missing sources are
    /// normalised to the literal `"Unknown"`.
    pub source: String,
    /// Document category, when known.
    pub doc_type: Option<String>,
}

/// Executed unstructured-retrieval output. Chunks are ordered by
/// descending relevance and capped at `k_max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstructuredResult {
    pub chunks: Vec<DocChunk>,
    pub answer_fragment: String,
}

/// A structured reference to the origin of evidence used in an answer.
///
/// Wire shape: `{"type":"sql","table":…}` or
/// `{"type":"rag","source":…,"doc_type":…}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceCitation {
    Sql {
        table: String,
    },
    Rag {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        doc_type: Option<String>,
    },
}

/// The retrieval path(s) that actually contributed content to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Structured,
    Unstructured,
    Hybrid,
    History,
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerMode::Structured => write!(f, "structured"),
            AnswerMode::Unstructured => write!(f, "unstructured"),
            AnswerMode::Hybrid => write!(f, "hybrid"),
            AnswerMode::History => write!(f, "history"),
        }
    }
}

/// The envelope returned for every handled turn.
///
/// Always well-formed: `answer` is non-empty, `sources` may be empty,
/// `mode` is a valid tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub mode: AnswerMode,
}

/// A request to the LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Optional system prompt.
    pub system: Option<String>,
    /// Conversation turns, oldest first. Must end with a user turn.
    pub messages: Vec<Turn>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A response from the LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_sql_wire_shape() {
        let c = SourceCitation::Sql {
            table: "incident_reports".into(),
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"type":"sql","table":"incident_reports"}"#);
    }

    #[test]
    fn citation_rag_wire_shape_with_doc_type() {
        let c = SourceCitation::Rag {
            source: "newsletter_2024_11.pdf".into(),
            doc_type: Some("newsletter".into()),
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(
            json,
            r#"{"type":"rag","source":"newsletter_2024_11.pdf","doc_type":"newsletter"}"#
        );
    }

    #[test]
    fn citation_rag_omits_missing_doc_type() {
        let c = SourceCitation::Rag {
            source: "Unknown".into(),
            doc_type: None,
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"type":"rag","source":"Unknown"}"#);
    }

    #[test]
    fn citation_round_trip() {
        let c = SourceCitation::Rag {
            source: "meeting_03.txt".into(),
            doc_type: Some("transcript".into()),
        };
        let json = serde_json::to_string(&c).unwrap();
        let parsed: SourceCitation = serde_json::from_str(&json).unwrap();
        assert_eq!(c, parsed);
    }

    #[test]
    fn answer_mode_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&AnswerMode::Hybrid).unwrap(),
            r#""hybrid""#
        );
        assert_eq!(AnswerMode::History.to_string(), "history");
    }

    #[test]
    fn turn_role_serialises_lowercase() {
        let t = Turn::user("hello");
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains(r#""role":"user""#));
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::User);
    }

    #[test]
    fn reuse_verdict_predicates() {
        assert!(ReuseVerdict::Reuse(ReuseReason::Judged).is_reuse());
        assert!(!ReuseVerdict::Refresh(RefreshReason::NoHistory).is_reuse());
    }

    #[test]
    fn routing_plan_display() {
        assert_eq!(RoutingPlan::Structured.to_string(), "structured");
        assert_eq!(RoutingPlan::Unstructured.to_string(), "unstructured");
        assert_eq!(RoutingPlan::Hybrid.to_string(), "hybrid");
        assert_eq!(RoutingPlan::History.to_string(), "history");
    }
}

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction for gateway operations.
//!
//! Every operation has a fixed system prompt and a user prompt whose
//! fields appear in a fixed order, so calls are pure functions of their
//! inputs. Answer-shaped operations instruct the model to respond as
//! compact JSON; token-shaped operations demand a single word.

use porchlight_core::{DocChunk, Turn};

pub const REUSE_SYSTEM: &str = "\
You decide whether a follow-up question can be answered from a cached summary \
of the previous retrieval, or whether fresh data retrieval is required.\n\
Reply REUSE if the cached data and the conversation already contain what the \
question needs: clarifications, rephrasings, breakdowns of figures already \
given, or summaries of what was said.\n\
Reply REFRESH if the question asks for a different time period, different \
metrics, a new topic, or anything not visible in the cached summary.\n\
Reply with exactly one word: REUSE or REFRESH.";

pub const CLASSIFY_SYSTEM: &str = "\
You are the routing classifier for a community data assistant that combines a \
civic-records database (service requests, incident reports, community events) \
with a library of community documents (newsletters, meeting transcripts, \
policy analyses).\n\
Classify the question into exactly one mode:\n\
- STRUCTURED: counts, totals, trends, schedules, or anything answered by \
querying civic records.\n\
- UNSTRUCTURED: opinions, perspectives, policies, newsletters, meeting \
discussions, or anything answered from documents.\n\
- HYBRID: questions that need both numbers and context.\n\
- HISTORY: questions about the conversation itself that need no data at all.\n\
Reply with exactly one word: STRUCTURED, UNSTRUCTURED, HYBRID, or HISTORY.";

pub const DRAFT_SYSTEM: &str = "\
You draft one read-only SQL query for SQLite against the schema provided.\n\
Rules: produce a single SELECT statement; never modify data; never invent \
tables or columns; compare dates as ISO 8601 strings.\n\
Respond only as compact JSON: {\"query\": \"...\"}.";

pub const SQL_ANSWER_SYSTEM: &str = "\
You are a friendly assistant helping neighbours understand their community's \
data. Use clear, everyday language.\n\
Ground every statement in the query result provided and never invent figures. \
Do not mention SQL, databases, or internal tools.\n\
Respond only as compact JSON: {\"answer\": \"...\"}.";

pub const RAG_ANSWER_SYSTEM: &str = "\
You are a friendly assistant helping neighbours understand community \
documents. Use clear, everyday language.\n\
Use only the provided SOURCES and do not add information unsupported by them. \
When quoting people or documents, briefly say who or what they are first. Do \
not mention retrieval methods or internal tools.\n\
Respond only as compact JSON: {\"answer\": \"...\"}.";

pub const MERGE_SYSTEM: &str = "\
You are a friendly assistant explaining community information to a general \
audience. You have a numeric finding and a contextual finding for the same \
question.\n\
Weave them into a single cohesive answer that blends the numbers with the \
context. Never invent data not present in either input. Do not mention \
databases, documents systems, or internal tools.\n\
Respond only as compact JSON: {\"answer\": \"...\"}.";

pub const HISTORY_SYSTEM: &str = "\
You are a friendly assistant continuing a conversation about community data.\n\
Answer the question using only the conversation so far and the previous \
answer provided. If they do not contain what the question needs, say so \
politely and suggest asking a new question. Do not mention internal tools.\n\
Respond only as compact JSON: {\"answer\": \"...\"}.";

/// Renders the most recent `window` turns as an uppercase-role transcript.
pub fn render_history(history: &[Turn], window: usize) -> String {
    let tail_start = history.len().saturating_sub(window);
    let tail = &history[tail_start..];
    if tail.is_empty() {
        return "(no previous conversation)".to_string();
    }
    tail.iter()
        .map(|turn| format!("{}: {}", turn.role.to_string().to_uppercase(), turn.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders retrieved chunks as numbered SOURCES blocks.
pub fn render_chunks(chunks: &[DocChunk]) -> String {
    let mut out = String::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        match &chunk.doc_type {
            Some(doc_type) => {
                out.push_str(&format!("[Source {}: {} ({})]\n", idx + 1, chunk.source, doc_type))
            }
            None => out.push_str(&format!("[Source {}: {}]\n", idx + 1, chunk.source)),
        }
        out.push_str(&chunk.text);
        out.push_str("\n\n");
    }
    out
}

pub fn reuse_user(question: &str, history_text: &str, digest_text: &str) -> String {
    format!(
        "Conversation:\n{history_text}\n\nCached retrieval summary:\n{digest_text}\n\
         Question: {question}\n\nReply with REUSE or REFRESH only."
    )
}

pub fn classify_user(question: &str, history_text: &str) -> String {
    format!(
        "Conversation:\n{history_text}\n\nQuestion: {question}\n\n\
         Reply with one mode word only."
    )
}

pub fn draft_user(question: &str, schema_text: &str, history_text: &str) -> String {
    format!(
        "Schema:\n{schema_text}\nConversation:\n{history_text}\n\n\
         Question: {question}\n\nJSON only."
    )
}

pub fn sql_answer_user(
    question: &str,
    columns: &[String],
    rows_json: &str,
    tables: &[String],
    truncated: bool,
) -> String {
    let truncation_note = if truncated {
        "\nNote: the row set was truncated at the row limit; say that more records exist.\n"
    } else {
        ""
    };
    format!(
        "Question: {question}\n\nTables consulted: {}\nColumns: {}\nRows (JSON):\n{rows_json}\n{truncation_note}\nJSON only.",
        tables.join(", "),
        columns.join(", "),
    )
}

pub fn rag_answer_user(question: &str, chunks_text: &str) -> String {
    format!("SOURCES:\n{chunks_text}Question: {question}\n\nJSON only.")
}

pub fn merge_user(question: &str, sql_fragment: &str, rag_fragment: &str) -> String {
    format!(
        "Question: {question}\n\nNumeric finding:\n{sql_fragment}\n\n\
         Context finding:\n{rag_fragment}\n\nJSON only."
    )
}

pub fn history_user(question: &str, history_text: &str, last_answer: &str) -> String {
    format!(
        "Conversation:\n{history_text}\n\nPrevious answer:\n{last_answer}\n\n\
         Question: {question}\n\nJSON only."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_renders_uppercase_roles() {
        let history = vec![Turn::user("How many?"), Turn::assistant("42.")];
        let rendered = render_history(&history, 10);
        assert_eq!(rendered, "USER: How many?\n\nASSISTANT: 42.");
    }

    #[test]
    fn history_respects_window() {
        let history: Vec<Turn> = (0..20).map(|i| Turn::user(format!("q{i}"))).collect();
        let rendered = render_history(&history, 3);
        assert!(!rendered.contains("q16"));
        assert!(rendered.contains("q17"));
        assert!(rendered.contains("q19"));
    }

    #[test]
    fn empty_history_placeholder() {
        assert_eq!(render_history(&[], 10), "(no previous conversation)");
    }

    #[test]
    fn chunks_render_with_and_without_doc_type() {
        let chunks = vec![
            DocChunk {
                text: "Residents raised traffic concerns.".into(),
                source: "meeting_03.txt".into(),
                doc_type: Some("transcript".into()),
            },
            DocChunk {
                text: "Unlabelled text.".into(),
                source: "Unknown".into(),
                doc_type: None,
            },
        ];
        let rendered = render_chunks(&chunks);
        assert!(rendered.contains("[Source 1: meeting_03.txt (transcript)]"));
        assert!(rendered.contains("[Source 2: Unknown]"));
    }

    #[test]
    fn sql_answer_user_includes_truncation_note_only_when_truncated() {
        let columns = vec!["total".to_string()];
        let tables = vec!["incident_reports".to_string()];
        let with = sql_answer_user("q", &columns, "[[42]]", &tables, true);
        let without = sql_answer_user("q", &columns, "[[42]]", &tables, false);
        assert!(with.contains("truncated"));
        assert!(!without.contains("truncated"));
    }
}

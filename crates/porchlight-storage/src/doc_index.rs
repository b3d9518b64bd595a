// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FTS5-backed document index.
//!
//! Stores community document chunks in SQLite with an FTS5 virtual
//! table kept in sync by triggers. BM25 scores (negative, more negative
//! = more relevant) are mapped onto the lower-is-more-similar distance
//! scale the retriever expects, so the router runs end-to-end without
//! an external vector database. A semantically-embedded index can be
//! swapped in behind the same trait.

use async_trait::async_trait;
use porchlight_core::{PorchlightError, ScoredChunk, VectorIndex};
use tokio_rusqlite::Connection;

/// Maps index-side failures onto the retrieval error taxonomy.
fn index_err(e: tokio_rusqlite::Error) -> PorchlightError {
    PorchlightError::Index {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}

/// Document index backed by SQLite FTS5.
pub struct Fts5DocumentIndex {
    conn: Connection,
}

impl Fts5DocumentIndex {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Creates the documents tables and sync triggers when absent.
    pub async fn ensure_schema(&self) -> Result<(), PorchlightError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS documents (
                        id INTEGER PRIMARY KEY,
                        content TEXT NOT NULL,
                        source TEXT,
                        doc_type TEXT
                    );

                    CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
                        content,
                        content='documents',
                        content_rowid='id'
                    );

                    CREATE TRIGGER IF NOT EXISTS documents_ai AFTER INSERT ON documents BEGIN
                        INSERT INTO documents_fts(rowid, content) VALUES (new.id, new.content);
                    END;

                    CREATE TRIGGER IF NOT EXISTS documents_ad AFTER DELETE ON documents BEGIN
                        INSERT INTO documents_fts(documents_fts, rowid, content)
                            VALUES('delete', old.id, old.content);
                    END;

                    CREATE TRIGGER IF NOT EXISTS documents_au AFTER UPDATE ON documents BEGIN
                        INSERT INTO documents_fts(documents_fts, rowid, content)
                            VALUES('delete', old.id, old.content);
                        INSERT INTO documents_fts(rowid, content) VALUES (new.id, new.content);
                    END;",
                )?;
                Ok(())
            })
            .await
            .map_err(index_err)
    }

    /// Adds one document chunk to the index.
    pub async fn add_document(
        &self,
        content: &str,
        source: Option<&str>,
        doc_type: Option<&str>,
    ) -> Result<(), PorchlightError> {
        let content = content.to_string();
        let source = source.map(str::to_string);
        let doc_type = doc_type.map(str::to_string);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (content, source, doc_type) VALUES (?1, ?2, ?3)",
                    rusqlite::params![content, source, doc_type],
                )?;
                Ok(())
            })
            .await
            .map_err(index_err)
    }
}

#[async_trait]
impl VectorIndex for Fts5DocumentIndex {
    async fn search(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, PorchlightError> {
        let Some(match_query) = fts_query(question) else {
            return Ok(vec![]);
        };

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT d.content, d.source, d.doc_type, bm25(documents_fts) AS score \
                     FROM documents_fts \
                     JOIN documents d ON d.id = documents_fts.rowid \
                     WHERE documents_fts MATCH ?1 \
                     ORDER BY bm25(documents_fts) \
                     LIMIT ?2",
                )?;
                let chunks = stmt
                    .query_map(rusqlite::params![match_query, k as i64], |row| {
                        let score: f64 = row.get(3)?;
                        Ok(ScoredChunk {
                            text: row.get(0)?,
                            source: row.get(1)?,
                            doc_type: row.get(2)?,
                            distance: bm25_to_distance(score),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await
            .map_err(index_err)
    }
}

/// Builds an FTS5 MATCH expression from free-form question text.
///
/// Each term is double-quoted so punctuation and FTS5 keywords in the
/// question cannot change the query syntax. Returns None when the
/// question has no usable term.
fn fts_query(question: &str) -> Option<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in question.split(|c: char| !c.is_ascii_alphanumeric()) {
        if word.len() < 2 {
            continue;
        }
        let quoted = format!("\"{}\"", word.to_lowercase());
        if !terms.contains(&quoted) {
            terms.push(quoted);
        }
    }
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// BM25 score (negative, more negative = more relevant) to a distance
/// in (0, 1], lower = more similar.
fn bm25_to_distance(score: f64) -> f64 {
    1.0 / (1.0 + (-score).max(0.0))
}

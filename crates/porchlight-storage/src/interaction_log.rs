// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed interaction log.
//!
//! The pipeline records turn summaries fire-and-forget; the HTTP surface
//! attaches feedback ratings to existing entries.

use async_trait::async_trait;
use porchlight_core::{InteractionRecord, InteractionSink, PorchlightError};
use tokio_rusqlite::Connection;

use crate::storage_err;

/// Persists turn summaries and ratings in the shared database.
pub struct SqliteInteractionLog {
    conn: Connection,
}

impl SqliteInteractionLog {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Creates the `interaction_log` table when absent.
    pub async fn ensure_schema(&self) -> Result<(), PorchlightError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS interaction_log (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        session_id TEXT NOT NULL,
                        client_query TEXT NOT NULL,
                        app_response TEXT NOT NULL,
                        mode TEXT NOT NULL,
                        client_response_rating TEXT,
                        created_at TEXT NOT NULL
                    );",
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl InteractionSink for SqliteInteractionLog {
    async fn record(&self, record: &InteractionRecord) -> Result<i64, PorchlightError> {
        let record = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO interaction_log \
                     (session_id, client_query, app_response, mode, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        record.session_id,
                        record.question,
                        record.answer,
                        record.mode,
                        record.created_at,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(storage_err)
    }

    async fn rate(&self, log_id: i64, rating: &str) -> Result<(), PorchlightError> {
        let rating = rating.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE interaction_log SET client_response_rating = ?1 WHERE id = ?2",
                    rusqlite::params![rating, log_id],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(session: &str, question: &str) -> InteractionRecord {
        InteractionRecord {
            session_id: session.into(),
            question: question.into(),
            answer: "an answer".into(),
            mode: "structured".into(),
            created_at: "2026-08-01T12:00:00Z".into(),
        }
    }

    async fn setup_log() -> SqliteInteractionLog {
        let conn = Connection::open_in_memory().await.unwrap();
        let log = SqliteInteractionLog::new(conn);
        log.ensure_schema().await.unwrap();
        log
    }

    #[tokio::test]
    async fn record_returns_sequential_ids() {
        let log = setup_log().await;
        let first = log.record(&record("a", "q1")).await.unwrap();
        let second = log.record(&record("a", "q2")).await.unwrap();
        assert_eq!(second, first + 1);
    }

    #[tokio::test]
    async fn rate_updates_existing_entry() {
        let log = setup_log().await;
        let id = log.record(&record("a", "q1")).await.unwrap();
        log.rate(id, "helpful").await.unwrap();

        let rating: Option<String> = log
            .conn
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT client_response_rating FROM interaction_log WHERE id = ?1",
                    rusqlite::params![id],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(rating.as_deref(), Some("helpful"));
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let log = setup_log().await;
        log.ensure_schema().await.unwrap();
        let id = log.record(&record("a", "q")).await.unwrap();
        assert!(id >= 1);
    }
}

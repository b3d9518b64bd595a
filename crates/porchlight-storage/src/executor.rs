// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only query executor over the civic-records database.
//!
//! Refuses any statement SQLite itself does not consider read-only
//! (`sqlite3_stmt_readonly`), fetches at most `row_limit + 1` rows to
//! detect truncation, and reports the tables the query referenced in
//! order of appearance.

use async_trait::async_trait;
use porchlight_core::{PorchlightError, QueryOutput, SqlExecutor};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::storage_err;

/// Executes drafted queries against a SQLite civic database.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    async fn execute_readonly(
        &self,
        sql: &str,
        row_limit: usize,
    ) -> Result<QueryOutput, PorchlightError> {
        let sql = sql.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let known_tables = list_user_tables(conn)?;

                let mut stmt = conn.prepare(&sql)?;
                if !stmt.readonly() {
                    return Err(tokio_rusqlite::Error::Rusqlite(
                        rusqlite::Error::InvalidQuery,
                    ));
                }

                let columns: Vec<String> =
                    stmt.column_names().iter().map(|c| c.to_string()).collect();
                let column_count = stmt.column_count();

                let mut out: Vec<Vec<serde_json::Value>> = Vec::new();
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let mut tuple = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        tuple.push(value_ref_to_json(row.get_ref(i)?));
                    }
                    out.push(tuple);
                    if out.len() > row_limit {
                        break;
                    }
                }

                let truncated = out.len() > row_limit;
                out.truncate(row_limit);

                let tables_referenced = referenced_tables(&sql, &known_tables);
                Ok(QueryOutput {
                    columns,
                    rows: out,
                    tables_referenced,
                    truncated,
                })
            })
            .await;

        match result {
            Ok(output) => {
                debug!(
                    rows = output.rows.len(),
                    truncated = output.truncated,
                    "query executed"
                );
                Ok(output)
            }
            Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::InvalidQuery)) => {
                Err(PorchlightError::Executor {
                    message: "statement refused: not read-only".to_string(),
                    source: None,
                })
            }
            Err(e) => Err(PorchlightError::Executor {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }),
        }
    }
}

/// Names of user tables, excluding SQLite internals and the router's
/// own bookkeeping tables.
pub(crate) fn list_user_tables(
    conn: &rusqlite::Connection,
) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' \
         AND name NOT LIKE 'documents%' \
         AND name NOT IN ('interaction_log', 'schema_metadata') \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Tables referenced by the statement, in order of first appearance.
///
/// Matches known table names as whole words in the statement text. This
/// stays inside the executor: callers treat the output as ground truth
/// and never parse the statement themselves.
fn referenced_tables(sql: &str, known_tables: &[String]) -> Vec<String> {
    let lower = sql.to_lowercase();
    let mut found: Vec<(usize, String)> = Vec::new();
    for table in known_tables {
        if let Some(pos) = find_word(&lower, &table.to_lowercase()) {
            found.push((pos, table.clone()));
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, table)| table).collect()
}

/// Position of `word` in `haystack` with identifier-boundary checks on
/// both sides, or None.
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(word) {
        let pos = start + offset;
        let before_ok = pos == 0
            || !haystack[..pos].chars().next_back().map(is_ident).unwrap_or(false);
        let after = pos + word.len();
        let after_ok = after >= haystack.len()
            || !haystack[after..].chars().next().map(is_ident).unwrap_or(false);
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + word.len();
    }
    None
}

/// Converts a SQLite value into JSON for the row payload.
fn value_ref_to_json(value: rusqlite::types::ValueRef<'_>) -> serde_json::Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::json!(i),
        ValueRef::Real(f) => serde_json::json!(f),
        ValueRef::Text(t) => serde_json::json!(String::from_utf8_lossy(t)),
        ValueRef::Blob(_) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_civic_db() -> Connection {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE incident_reports (
                    id INTEGER PRIMARY KEY,
                    category TEXT,
                    occurred_on TEXT
                );
                CREATE TABLE weekly_events (
                    id INTEGER PRIMARY KEY,
                    event_name TEXT,
                    start_date TEXT
                );
                INSERT INTO incident_reports (category, occurred_on) VALUES
                    ('noise', '2024-11-02'),
                    ('traffic', '2024-11-10'),
                    ('noise', '2024-12-01');",
            )?;
            Ok(())
        })
        .await
        .unwrap();
        conn
    }

    #[tokio::test]
    async fn select_returns_columns_and_rows() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let out = executor
            .execute_readonly(
                "SELECT category, COUNT(*) AS total FROM incident_reports GROUP BY category ORDER BY category",
                500,
            )
            .await
            .unwrap();

        assert_eq!(out.columns, vec!["category", "total"]);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0][0], serde_json::json!("noise"));
        assert_eq!(out.rows[0][1], serde_json::json!(2));
        assert_eq!(out.tables_referenced, vec!["incident_reports"]);
        assert!(!out.truncated);
    }

    #[tokio::test]
    async fn write_statement_refused() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let result = executor
            .execute_readonly("DELETE FROM incident_reports", 500)
            .await;
        match result {
            Err(PorchlightError::Executor { message, .. }) => {
                assert!(message.contains("not read-only"), "got: {message}");
            }
            other => panic!("expected refusal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncation_detected_past_row_limit() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let out = executor
            .execute_readonly("SELECT id FROM incident_reports", 2)
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 2);
        assert!(out.truncated);
    }

    #[tokio::test]
    async fn exactly_row_limit_rows_not_truncated() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let out = executor
            .execute_readonly("SELECT id FROM incident_reports", 3)
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 3);
        assert!(!out.truncated);
    }

    #[tokio::test]
    async fn join_references_both_tables_in_order() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let out = executor
            .execute_readonly(
                "SELECT e.event_name FROM weekly_events e JOIN incident_reports r ON r.id = e.id",
                500,
            )
            .await
            .unwrap();
        assert_eq!(
            out.tables_referenced,
            vec!["weekly_events", "incident_reports"]
        );
    }

    #[tokio::test]
    async fn syntax_error_reported_as_executor_error() {
        let executor = SqliteExecutor::new(setup_civic_db().await);
        let result = executor.execute_readonly("SELECT FROM WHERE", 500).await;
        assert!(matches!(result, Err(PorchlightError::Executor { .. })));
    }

    #[test]
    fn find_word_respects_identifier_boundaries() {
        assert!(find_word("select * from incident_reports", "incident_reports").is_some());
        assert!(find_word("select incident_reports_archive from t", "incident_reports").is_none());
        assert!(find_word("select x from old_incident_reports", "incident_reports").is_none());
    }

    #[test]
    fn null_and_real_values_convert() {
        use rusqlite::types::ValueRef;
        assert_eq!(value_ref_to_json(ValueRef::Null), serde_json::Value::Null);
        assert_eq!(
            value_ref_to_json(ValueRef::Real(1.5)),
            serde_json::json!(1.5)
        );
    }
}

// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema catalog over the civic database.
//!
//! Table and column shapes come from SQLite itself; human-written
//! descriptions and per-table keyword lists live in an optional
//! `schema_metadata` table so the catalog can be enriched without code
//! changes. Keyword hints drive both query-draft grounding and the
//! structured-keyword promotion check upstream.

use std::collections::HashMap;

use async_trait::async_trait;
use porchlight_core::{ColumnInfo, PorchlightError, SchemaCatalog, TableInfo};
use tokio_rusqlite::Connection;

use crate::executor::list_user_tables;
use crate::storage_err;

/// Per-table metadata row from `schema_metadata`.
#[derive(Debug, Clone, Default)]
struct TableMetadata {
    description: Option<String>,
    keywords: Vec<String>,
}

/// Schema metadata service backed by the civic database.
pub struct SqliteSchemaCatalog {
    conn: Connection,
}

impl SqliteSchemaCatalog {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Creates the `schema_metadata` table when absent.
    pub async fn ensure_schema(&self) -> Result<(), PorchlightError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS schema_metadata (
                        table_name TEXT PRIMARY KEY NOT NULL,
                        description TEXT,
                        keywords TEXT
                    );",
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Upserts description and comma-separated keywords for a table.
    pub async fn describe_table(
        &self,
        table: &str,
        description: &str,
        keywords: &str,
    ) -> Result<(), PorchlightError> {
        let table = table.to_string();
        let description = description.to_string();
        let keywords = keywords.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO schema_metadata (table_name, description, keywords) \
                     VALUES (?1, ?2, ?3) \
                     ON CONFLICT(table_name) DO UPDATE SET \
                         description = excluded.description, \
                         keywords = excluded.keywords",
                    rusqlite::params![table, description, keywords],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn load_metadata(&self) -> Result<HashMap<String, TableMetadata>, PorchlightError> {
        self.conn
            .call(|conn| {
                let mut out = HashMap::new();
                // Metadata is optional: a database without the table is fine.
                let Ok(mut stmt) =
                    conn.prepare("SELECT table_name, description, keywords FROM schema_metadata")
                else {
                    return Ok(out);
                };
                let rows = stmt.query_map([], |row| {
                    let name: String = row.get(0)?;
                    let description: Option<String> = row.get(1)?;
                    let keywords: Option<String> = row.get(2)?;
                    Ok((name, description, keywords))
                })?;
                for row in rows {
                    let (name, description, keywords) = row?;
                    out.insert(
                        name,
                        TableMetadata {
                            description,
                            keywords: keywords
                                .unwrap_or_default()
                                .split(',')
                                .map(|k| k.trim().to_lowercase())
                                .filter(|k| !k.is_empty())
                                .collect(),
                        },
                    );
                }
                Ok(out)
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl SchemaCatalog for SqliteSchemaCatalog {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, PorchlightError> {
        let metadata = self.load_metadata().await?;
        self.conn
            .call(move |conn| {
                let names = list_user_tables(conn)?;
                let mut tables = Vec::with_capacity(names.len());
                for name in names {
                    let mut stmt =
                        conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&name)))?;
                    let columns = stmt
                        .query_map([], |row| {
                            Ok(ColumnInfo {
                                name: row.get(1)?,
                                data_type: row.get(2)?,
                                description: None,
                            })
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    let description = metadata.get(&name).and_then(|m| m.description.clone());
                    tables.push(TableInfo {
                        name,
                        description,
                        columns,
                    });
                }
                Ok(tables)
            })
            .await
            .map_err(storage_err)
    }

    async fn keyword_hint(&self, question: &str) -> Result<Vec<String>, PorchlightError> {
        let metadata = self.load_metadata().await?;
        let lower = question.to_lowercase();

        let names = self
            .conn
            .call(|conn| Ok(list_user_tables(conn)?))
            .await
            .map_err(storage_err)?;

        let mut hints = Vec::new();
        for name in names {
            let name_as_phrase = name.replace('_', " ");
            let mut matches = lower.contains(&name.to_lowercase())
                || lower.contains(&name_as_phrase.to_lowercase());

            if !matches {
                if let Some(meta) = metadata.get(&name) {
                    matches = meta.keywords.iter().any(|keyword| lower.contains(keyword));
                }
            }

            if matches && !hints.contains(&name) {
                hints.push(name);
            }
        }
        Ok(hints)
    }
}

/// Quotes an identifier for PRAGMA interpolation.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_catalog() -> SqliteSchemaCatalog {
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
                    event_name TEXT
                );
                CREATE TABLE interaction_log (id INTEGER PRIMARY KEY);",
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let catalog = SqliteSchemaCatalog::new(conn);
        catalog.ensure_schema().await.unwrap();
        catalog
    }

    #[tokio::test]
    async fn list_tables_excludes_bookkeeping_tables() {
        let catalog = setup_catalog().await;
        let tables = catalog.list_tables().await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["incident_reports", "weekly_events"]);
    }

    #[tokio::test]
    async fn list_tables_reads_columns_and_descriptions() {
        let catalog = setup_catalog().await;
        catalog
            .describe_table("incident_reports", "Public safety incidents", "incident, safety")
            .await
            .unwrap();

        let tables = catalog.list_tables().await.unwrap();
        let incidents = tables.iter().find(|t| t.name == "incident_reports").unwrap();
        assert_eq!(incidents.description.as_deref(), Some("Public safety incidents"));
        assert!(incidents.columns.iter().any(|c| c.name == "occurred_on"));
    }

    #[tokio::test]
    async fn hint_matches_table_name_and_phrase() {
        let catalog = setup_catalog().await;
        let hints = catalog
            .keyword_hint("How many incident reports happened in November 2024?")
            .await
            .unwrap();
        assert_eq!(hints, vec!["incident_reports"]);
    }

    #[tokio::test]
    async fn hint_matches_metadata_keywords() {
        let catalog = setup_catalog().await;
        catalog
            .describe_table("weekly_events", "Community events", "event, events, happening, weekend")
            .await
            .unwrap();

        let hints = catalog
            .keyword_hint("What is happening this weekend?")
            .await
            .unwrap();
        assert_eq!(hints, vec!["weekly_events"]);
    }

    #[tokio::test]
    async fn no_hint_for_unrelated_question() {
        let catalog = setup_catalog().await;
        let hints = catalog
            .keyword_hint("What do residents think about the library?")
            .await
            .unwrap();
        assert!(hints.is_empty());
    }
}

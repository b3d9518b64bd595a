// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema metadata collaborator: table/column descriptions and keyword hints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PorchlightError;

/// Description of a single column in a civic-records table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Description of a civic-records table, used to ground query drafting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    /// Renders the table as a compact one-table-per-block prompt section.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("TABLE {}", self.name));
        if let Some(desc) = &self.description {
            out.push_str(&format!(" -- {desc}"));
        }
        out.push('\n');
        for col in &self.columns {
            out.push_str(&format!("  {} {}", col.name, col.data_type));
            if let Some(desc) = &col.description {
                out.push_str(&format!(" -- {desc}"));
            }
            out.push('\n');
        }
        out
    }
}

/// Read-only, cacheable schema metadata service.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// All known tables with column descriptions.
    async fn list_tables(&self) -> Result<Vec<TableInfo>, PorchlightError>;

    /// Names of tables whose keyword lists match the question. Empty
    /// when no table is plausible for the question.
    async fn keyword_hint(&self, question: &str) -> Result<Vec<String>, PorchlightError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_table_and_columns() {
        let table = TableInfo {
            name: "incident_reports".into(),
            description: Some("Public safety incidents".into()),
            columns: vec![
                ColumnInfo {
                    name: "occurred_on".into(),
                    data_type: "TEXT".into(),
                    description: Some("ISO 8601 date".into()),
                },
                ColumnInfo {
                    name: "category".into(),
                    data_type: "TEXT".into(),
                    description: None,
                },
            ],
        };
        let rendered = table.render();
        assert!(rendered.starts_with("TABLE incident_reports -- Public safety incidents"));
        assert!(rendered.contains("occurred_on TEXT -- ISO 8601 date"));
        assert!(rendered.contains("category TEXT\n"));
    }
}

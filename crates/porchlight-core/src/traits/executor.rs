// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database executor collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PorchlightError;

/// Output of one executed read-only query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row tuples, each with arity `columns.len()`.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Tables the query actually referenced. Ground truth for citations:
    /// callers must never infer tables from the query text instead.
    pub tables_referenced: Vec<String>,
    /// True when the executor dropped rows beyond the row limit.
    pub truncated: bool,
}

/// Executes read-only queries against the civic-records database.
///
/// Implementations must refuse non-read-only statements and must be
/// parameter-safe. The core additionally guards drafts before they
/// reach this trait.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute_readonly(
        &self,
        sql: &str,
        row_limit: usize,
    ) -> Result<QueryOutput, PorchlightError>;
}

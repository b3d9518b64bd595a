// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counting stub collaborators for retrieval-side traits.
//!
//! Each stub counts its invocations so tests can assert that a code path
//! performed (or, for history turns, did not perform) retrieval.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use porchlight_core::{
    ColumnInfo, InteractionRecord, InteractionSink, PorchlightError, QueryOutput, SchemaCatalog,
    ScoredChunk, SqlExecutor, TableInfo, VectorIndex,
};

/// Schema catalog stub: fixed tables plus a keyword -> table mapping.
pub struct MockSchemaCatalog {
    tables: Vec<TableInfo>,
    keywords: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl MockSchemaCatalog {
    pub fn new(tables: Vec<TableInfo>) -> Self {
        Self {
            tables,
            keywords: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Convenience: a catalog with one table per (name, description) pair
    /// and the table name doubling as its keyword.
    pub fn with_tables(names: &[&str]) -> Self {
        let tables = names
            .iter()
            .map(|name| TableInfo {
                name: name.to_string(),
                description: None,
                columns: vec![ColumnInfo {
                    name: "id".into(),
                    data_type: "INTEGER".into(),
                    description: None,
                }],
            })
            .collect();
        let keywords = names
            .iter()
            .map(|name| (name.to_string(), name.to_string()))
            .collect();
        Self {
            tables,
            keywords,
            calls: AtomicUsize::new(0),
        }
    }

    /// Maps a lowercase keyword to a candidate table name.
    pub fn add_keyword(mut self, keyword: &str, table: &str) -> Self {
        self.keywords.push((keyword.to_lowercase(), table.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaCatalog for MockSchemaCatalog {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, PorchlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.clone())
    }

    async fn keyword_hint(&self, question: &str) -> Result<Vec<String>, PorchlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = question.to_lowercase();
        let mut hints = Vec::new();
        for (keyword, table) in &self.keywords {
            if lower.contains(keyword) && !hints.contains(table) {
                hints.push(table.clone());
            }
        }
        Ok(hints)
    }
}

/// Database executor stub: scripted outputs popped in FIFO order.
pub struct MockExecutor {
    outputs: Mutex<VecDeque<Result<QueryOutput, String>>>,
    executed: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
            executed: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a successful query output.
    pub async fn push_output(&self, output: QueryOutput) {
        self.outputs.lock().await.push_back(Ok(output));
    }

    /// Queue an executor-side failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.outputs.lock().await.push_back(Err(message.into()));
    }

    /// SQL texts handed to the executor, in order.
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A one-row, one-column count result referencing `table`.
    pub fn count_output(table: &str, count: i64) -> QueryOutput {
        QueryOutput {
            columns: vec!["total".into()],
            rows: vec![vec![serde_json::json!(count)]],
            tables_referenced: vec![table.to_string()],
            truncated: false,
        }
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn execute_readonly(
        &self,
        sql: &str,
        _row_limit: usize,
    ) -> Result<QueryOutput, PorchlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().await.push(sql.to_string());

        match self.outputs.lock().await.pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(PorchlightError::Executor {
                message,
                source: None,
            }),
            None => Ok(QueryOutput {
                columns: vec![],
                rows: vec![],
                tables_referenced: vec![],
                truncated: false,
            }),
        }
    }
}

/// Scripted failure flavours for [`MockIndex`].
enum IndexFailure {
    Index(String),
    Embedding(String),
}

/// Document index stub: scripted search hits popped in FIFO order.
pub struct MockIndex {
    hits: Mutex<VecDeque<Result<Vec<ScoredChunk>, IndexFailure>>>,
    calls: AtomicUsize,
}

impl MockIndex {
    pub fn new() -> Self {
        Self {
            hits: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn push_hits(&self, hits: Vec<ScoredChunk>) {
        self.hits.lock().await.push_back(Ok(hits));
    }

    pub async fn push_error(&self, message: impl Into<String>) {
        self.hits
            .lock()
            .await
            .push_back(Err(IndexFailure::Index(message.into())));
    }

    pub async fn push_embedding_error(&self, message: impl Into<String>) {
        self.hits
            .lock()
            .await
            .push_back(Err(IndexFailure::Embedding(message.into())));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A chunk with the given source and a close distance.
    pub fn chunk(text: &str, source: &str, doc_type: Option<&str>, distance: f64) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            source: Some(source.to_string()),
            doc_type: doc_type.map(str::to_string),
            distance,
        }
    }
}

impl Default for MockIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MockIndex {
    async fn search(
        &self,
        _question: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, PorchlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.hits.lock().await.pop_front() {
            Some(Ok(mut hits)) => {
                hits.truncate(k);
                Ok(hits)
            }
            Some(Err(IndexFailure::Index(message))) => Err(PorchlightError::Index {
                message,
                source: None,
            }),
            Some(Err(IndexFailure::Embedding(message))) => {
                Err(PorchlightError::Embedding(message))
            }
            None => Ok(vec![]),
        }
    }
}

/// Interaction sink stub: records everything in memory.
pub struct MockSink {
    records: Arc<Mutex<Vec<InteractionRecord>>>,
    ratings: Arc<Mutex<Vec<(i64, String)>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            ratings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn ratings(&self) -> Vec<(i64, String)> {
        self.ratings.lock().await.clone()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractionSink for MockSink {
    async fn record(&self, record: &InteractionRecord) -> Result<i64, PorchlightError> {
        let mut records = self.records.lock().await;
        records.push(record.clone());
        Ok(records.len() as i64)
    }

    async fn rate(&self, log_id: i64, rating: &str) -> Result<(), PorchlightError> {
        self.ratings.lock().await.push((log_id, rating.to_string()));
        Ok(())
    }
}

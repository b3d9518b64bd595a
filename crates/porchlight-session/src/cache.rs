// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session cache: merge-on-put entries with idle-TTL and LRU
//! capacity eviction.
//!
//! A single lock guards the map and is held only for the duration of a
//! `get`, `put`, or `sweep`; retrieval work happens outside it. `get`
//! and `put` both refresh `last_touched_at`, and `put` sweeps
//! opportunistically so a long-lived process stays bounded even when
//! nobody calls `sweep` explicitly.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use porchlight_config::model::CacheConfig;
use porchlight_core::{AnswerMode, StructuredResult, UnstructuredResult};
use tokio::sync::Mutex;
use tracing::debug;

/// Per-session bundle of the most recent retrieval artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub session_id: String,
    pub last_touched_at: DateTime<Utc>,
    pub structured: Option<StructuredResult>,
    pub unstructured: Option<UnstructuredResult>,
    pub last_answer: Option<String>,
    pub last_mode: Option<AnswerMode>,
}

impl CacheEntry {
    fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            last_touched_at: now,
            structured: None,
            unstructured: None,
            last_answer: None,
            last_mode: None,
        }
    }

    /// True when the entry holds at least one retrieval artifact.
    pub fn has_artifacts(&self) -> bool {
        self.structured.is_some() || self.unstructured.is_some()
    }
}

/// Partial entry handed to `put`. Provided fields replace the entry's
/// fields wholesale; unprovided fields are preserved.
#[derive(Debug, Clone, Default)]
pub struct CacheUpdate {
    pub structured: Option<StructuredResult>,
    pub unstructured: Option<UnstructuredResult>,
    pub last_answer: Option<String>,
    pub last_mode: Option<AnswerMode>,
}

/// Bounded, process-local store keyed by session identifier.
pub struct SessionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            idle_ttl: Duration::minutes(config.idle_ttl_minutes as i64),
            max_sessions: config.max_sessions,
        }
    }

    /// Returns a snapshot of the session's entry, refreshing its
    /// `last_touched_at` on hit.
    pub async fn get(&self, session_id: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(session_id)?;
        entry.last_touched_at = Utc::now();
        Some(entry.clone())
    }

    /// Merges the provided fields into the session's entry, creating one
    /// if none exists, then enforces the capacity bound.
    pub async fn put(&self, session_id: &str, update: CacheUpdate) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;

        Self::evict_idle(&mut entries, now, self.idle_ttl);

        let entry = entries
            .entry(session_id.to_string())
            .or_insert_with(|| CacheEntry::new(session_id, now));
        entry.last_touched_at = now;
        if let Some(structured) = update.structured {
            entry.structured = Some(structured);
        }
        if let Some(unstructured) = update.unstructured {
            entry.unstructured = Some(unstructured);
        }
        if let Some(last_answer) = update.last_answer {
            entry.last_answer = Some(last_answer);
        }
        if let Some(last_mode) = update.last_mode {
            entry.last_mode = Some(last_mode);
        }

        Self::evict_over_capacity(&mut entries, self.max_sessions);
    }

    /// Evicts idle and over-capacity entries. Idempotent: a second sweep
    /// immediately after a first finds nothing to do.
    pub async fn sweep(&self) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        Self::evict_idle(&mut entries, now, self.idle_ttl);
        Self::evict_over_capacity(&mut entries, self.max_sessions);
    }

    /// Number of cached sessions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn evict_idle(entries: &mut HashMap<String, CacheEntry>, now: DateTime<Utc>, ttl: Duration) {
        let before = entries.len();
        entries.retain(|_, entry| now - entry.last_touched_at <= ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted idle sessions");
        }
    }

    fn evict_over_capacity(entries: &mut HashMap<String, CacheEntry>, max_sessions: usize) {
        while entries.len() > max_sessions {
            let oldest = entries
                .values()
                .min_by_key(|entry| entry.last_touched_at)
                .map(|entry| entry.session_id.clone());
            match oldest {
                Some(session_id) => {
                    entries.remove(&session_id);
                    debug!(session_id, "evicted least-recently-touched session");
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porchlight_core::DocChunk;

    fn cache_with(max_sessions: usize, idle_ttl_minutes: u64) -> SessionCache {
        SessionCache::new(&CacheConfig {
            idle_ttl_minutes,
            max_sessions,
        })
    }

    fn structured(tables: &[&str]) -> StructuredResult {
        StructuredResult {
            columns: vec!["total".into()],
            rows: vec![vec![serde_json::json!(42)]],
            tables: tables.iter().map(|t| t.to_string()).collect(),
            answer_fragment: "42.".into(),
            sql_text: "SELECT COUNT(*) FROM t".into(),
            truncated: false,
        }
    }

    fn unstructured(sources: &[&str]) -> UnstructuredResult {
        UnstructuredResult {
            chunks: sources
                .iter()
                .map(|s| DocChunk {
                    text: "text".into(),
                    source: s.to_string(),
                    doc_type: None,
                })
                .collect(),
            answer_fragment: "context.".into(),
        }
    }

    async fn backdate(cache: &SessionCache, session_id: &str, minutes: i64) {
        let mut entries = cache.entries.lock().await;
        let entry = entries.get_mut(session_id).unwrap();
        entry.last_touched_at = entry.last_touched_at - Duration::minutes(minutes);
    }

    #[tokio::test]
    async fn put_then_get_returns_merged_fields() {
        let cache = cache_with(10, 60);
        cache
            .put(
                "a",
                CacheUpdate {
                    structured: Some(structured(&["incident_reports"])),
                    last_answer: Some("42.".into()),
                    last_mode: Some(AnswerMode::Structured),
                    ..Default::default()
                },
            )
            .await;

        let entry = cache.get("a").await.unwrap();
        assert_eq!(entry.session_id, "a");
        assert_eq!(entry.structured.unwrap().tables, vec!["incident_reports"]);
        assert!(entry.unstructured.is_none());
        assert_eq!(entry.last_answer.as_deref(), Some("42."));
        assert_eq!(entry.last_mode, Some(AnswerMode::Structured));
    }

    #[tokio::test]
    async fn get_miss_returns_none() {
        let cache = cache_with(10, 60);
        assert!(cache.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn put_preserves_unprovided_fields() {
        let cache = cache_with(10, 60);
        cache
            .put(
                "a",
                CacheUpdate {
                    unstructured: Some(unstructured(&["doc1", "doc2"])),
                    ..Default::default()
                },
            )
            .await;
        cache
            .put(
                "a",
                CacheUpdate {
                    structured: Some(structured(&["weekly_events"])),
                    ..Default::default()
                },
            )
            .await;

        let entry = cache.get("a").await.unwrap();
        // Both sides present: the second put did not clear the first.
        assert!(entry.structured.is_some());
        let chunks = entry.unstructured.unwrap().chunks;
        // Prior sequences keep their order across puts.
        assert_eq!(chunks[0].source, "doc1");
        assert_eq!(chunks[1].source, "doc2");
    }

    #[tokio::test]
    async fn put_replaces_provided_side_wholesale() {
        let cache = cache_with(10, 60);
        cache
            .put(
                "a",
                CacheUpdate {
                    structured: Some(structured(&["old_table"])),
                    ..Default::default()
                },
            )
            .await;
        cache
            .put(
                "a",
                CacheUpdate {
                    structured: Some(structured(&["new_table"])),
                    ..Default::default()
                },
            )
            .await;

        let entry = cache.get("a").await.unwrap();
        assert_eq!(entry.structured.unwrap().tables, vec!["new_table"]);
    }

    #[tokio::test]
    async fn get_refreshes_last_touched() {
        let cache = cache_with(10, 60);
        cache.put("a", CacheUpdate::default()).await;
        backdate(&cache, "a", 30).await;

        let stale = { cache.entries.lock().await.get("a").unwrap().last_touched_at };
        let entry = cache.get("a").await.unwrap();
        assert!(entry.last_touched_at > stale);
    }

    #[tokio::test]
    async fn sweep_evicts_idle_entries() {
        let cache = cache_with(10, 60);
        cache.put("fresh", CacheUpdate::default()).await;
        cache.put("stale", CacheUpdate::default()).await;
        backdate(&cache, "stale", 61).await;

        cache.sweep().await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("fresh").await.is_some());
        assert!(cache.get("stale").await.is_none());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let cache = cache_with(10, 60);
        cache.put("a", CacheUpdate::default()).await;
        cache.put("b", CacheUpdate::default()).await;
        backdate(&cache, "b", 120).await;

        cache.sweep().await;
        let after_first: Vec<String> = {
            let entries = cache.entries.lock().await;
            let mut ids: Vec<_> = entries.keys().cloned().collect();
            ids.sort();
            ids
        };

        cache.sweep().await;
        let after_second: Vec<String> = {
            let entries = cache.entries.lock().await;
            let mut ids: Vec<_> = entries.keys().cloned().collect();
            ids.sort();
            ids
        };

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn capacity_eviction_removes_least_recently_touched() {
        let cache = cache_with(3, 60);
        for id in ["a", "b", "c"] {
            cache.put(id, CacheUpdate::default()).await;
        }
        // Make "b" the LRU entry.
        backdate(&cache, "b", 10).await;
        backdate(&cache, "a", 5).await;

        cache.put("d", CacheUpdate::default()).await;

        assert_eq!(cache.len().await, 3);
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("c").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn capacity_eviction_evicts_exactly_one_for_one_insert() {
        let cache = cache_with(2, 60);
        cache.put("a", CacheUpdate::default()).await;
        cache.put("b", CacheUpdate::default()).await;
        backdate(&cache, "a", 10).await;

        cache.put("c", CacheUpdate::default()).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn put_touches_existing_entry_without_eviction() {
        let cache = cache_with(2, 60);
        cache.put("a", CacheUpdate::default()).await;
        cache.put("b", CacheUpdate::default()).await;

        // Re-putting an existing session must not evict anything.
        cache
            .put(
                "a",
                CacheUpdate {
                    last_answer: Some("hi".into()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn has_artifacts_reflects_retrieval_state() {
        let cache = cache_with(10, 60);
        cache.put("a", CacheUpdate::default()).await;
        assert!(!cache.get("a").await.unwrap().has_artifacts());

        cache
            .put(
                "a",
                CacheUpdate {
                    unstructured: Some(unstructured(&["doc1"])),
                    ..Default::default()
                },
            )
            .await;
        assert!(cache.get("a").await.unwrap().has_artifacts());
    }
}

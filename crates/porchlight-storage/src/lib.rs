// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed collaborator implementations for the Porchlight QA
//! router.
//!
//! The core only sees the traits in `porchlight-core`; this crate
//! provides concrete implementations that share one SQLite file: the
//! civic-records executor, the schema catalog with keyword hints, the
//! FTS5 document index, and the interaction log.

pub mod catalog;
pub mod doc_index;
pub mod executor;
pub mod interaction_log;

use porchlight_core::PorchlightError;
use tokio_rusqlite::Connection;

pub use catalog::SqliteSchemaCatalog;
pub use doc_index::Fts5DocumentIndex;
pub use executor::SqliteExecutor;
pub use interaction_log::SqliteInteractionLog;

/// Helper to convert tokio_rusqlite errors into PorchlightError::Storage.
pub(crate) fn storage_err(e: tokio_rusqlite::Error) -> PorchlightError {
    PorchlightError::Storage {
        source: Box::new(e),
    }
}

/// Opens the shared SQLite database file.
pub async fn open_database(path: &str) -> Result<Connection, PorchlightError> {
    Connection::open(path).await.map_err(storage_err)
}

/// Opens an in-memory database (tests, demos).
pub async fn open_in_memory() -> Result<Connection, PorchlightError> {
    Connection::open_in_memory().await.map_err(storage_err)
}

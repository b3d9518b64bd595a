// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, process-local session cache for the Porchlight QA router.
//!
//! Holds the most recent retrieval artifacts and last answer per session,
//! evicting by idle age and by capacity. The cache is the only shared
//! mutable state in the core; entries are owned here exclusively and
//! callers receive snapshots.

pub mod cache;

pub use cache::{CacheEntry, CacheUpdate, SessionCache};

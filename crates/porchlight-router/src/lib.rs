// SPDX-FileCopyrightText: 2026 Porchlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decisions for the Porchlight QA router.
//!
//! Two small components consulted by the execution pipeline before any
//! retrieval happens: the [`ReuseJudge`] decides whether cached
//! artifacts already answer the turn, and the [`ModeClassifier`]
//! decides which retrieval path(s) a fresh turn should take.

pub mod classifier;
pub mod reuse;
pub mod temporal;

pub use classifier::ModeClassifier;
pub use reuse::{build_digest, ReuseJudge};

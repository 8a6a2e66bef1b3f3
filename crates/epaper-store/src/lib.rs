// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// epaper-store: the page store collaborator.
//
// Pages and their embedded region lists are stored as one unit keyed by page
// id. There is no per-region API: every region change is a whole-list replace.
// This crate defines the async `PageStore` and `ArticleCatalog` seams and
// ships an in-memory store, a SQLite-backed store and a timeout decorator.

pub mod memory;
pub mod sqlite;
pub mod timed;
pub mod traits;

pub use memory::{ArticleIndex, MemoryPageStore};
pub use sqlite::SqlitePageStore;
pub use timed::TimedStore;
pub use traits::{ArticleCatalog, PageStore};

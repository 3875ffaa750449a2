// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk Cache — stable printer identifiers and the stale-while-revalidate
// printer directory, persisted through a pluggable key-value store.

pub mod directory;
pub mod identity;
pub mod store;

pub use directory::{CacheState, PrinterDirectory};
pub use identity::printer_id;
pub use store::{CacheStore, MemoryStore, SqliteStore, open_store};

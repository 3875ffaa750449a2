// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer identity — stable identifiers derived from printer names.

use sha2::{Digest, Sha256};

/// Length of a printer identifier in hex characters.
pub const PRINTER_ID_LEN: usize = 16;

/// Derive the stable identifier for a printer name.
///
/// The name is trimmed and lowercased, hashed with SHA-256, and the first
/// 16 hex characters kept.  Names that differ only in case or surrounding
/// whitespace therefore share an id, and the id never depends on discovery
/// order.
pub fn printer_id(name: &str) -> String {
    let normalized = name.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(PRINTER_ID_LEN);
    id
}

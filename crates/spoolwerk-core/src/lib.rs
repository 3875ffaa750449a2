// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolwerk — Core types, error definitions, and configuration shared across
// all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CacheBackend, CacheConfig, GatewayConfig, TransportKind};
pub use error::{ErrorKind, SpoolwerkError};
pub use types::*;

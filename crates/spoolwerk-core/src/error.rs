// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spoolwerk.

use std::time::Duration;

use thiserror::Error;

use crate::types::{Capability, Operation};

/// Top-level error type for all Spoolwerk operations.
#[derive(Debug, Error)]
pub enum SpoolwerkError {
    // -- Transport failures --
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({code}): {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} did not finish within {after:?}")]
    CommandTimeout { program: String, after: Duration },

    #[error("IPP request failed: {0}")]
    Ipp(String),

    #[error("LPD transfer failed: {0}")]
    Lpd(String),

    // -- Capability --
    #[error("{operation} is not supported by the {transport} transport (use a {supported_by} adapter)")]
    Unsupported {
        operation: Operation,
        transport: &'static str,
        supported_by: Capability,
    },

    // -- Lookup / request shape --
    #[error("printer with id \"{0}\" not found; refresh the printer list")]
    PrinterNotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),

    // -- Storage / persistence --
    #[error("cache store error: {0}")]
    Store(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`SpoolwerkError`], used to shape responses at
/// the inbound boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Unsupported,
    NotFound,
    Validation,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case label used in serialized outcomes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Unsupported => "unsupported",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

impl SpoolwerkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spawn { .. }
            | Self::CommandFailed { .. }
            | Self::CommandTimeout { .. }
            | Self::Ipp(_)
            | Self::Lpd(_) => ErrorKind::Transport,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::PrinterNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolwerkError>;

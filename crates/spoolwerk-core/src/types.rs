// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Spoolwerk print gateway.
//
// Printer and job state is owned by the remote spooler; these values are
// observations of it.  Only `CacheEntry` is ever persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A print queue as discovered on the transport.
///
/// `name` is the transport-level queue identifier and may be renamed or
/// removed server-side at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    pub name: String,
    /// Synthesized locator, e.g. `smb://<host>/<encoded-name>`.
    pub uri: String,
}

impl Printer {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// A discovered printer paired with its stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPrinter {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub cached_at: DateTime<Utc>,
}

/// The unit of cache storage.  Serialized as `{printers, lastUpdated}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub printers: Vec<CachedPrinter>,
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    /// Look up a printer by its identifier.
    pub fn find(&self, id: &str) -> Option<&CachedPrinter> {
        self.printers.iter().find(|p| p.id == id)
    }

    /// Age of the entry relative to `now`.  Negative ages (clock skew) clamp
    /// to zero.
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.last_updated).to_std().unwrap_or_default()
    }
}

/// Operational state of a printer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrinterState {
    Online,
    Offline,
    Paused,
    Error,
    Unknown,
}

impl PrinterState {
    /// Decode the spooler's printer status bit field.
    ///
    /// `0` is online; otherwise the first matching bit wins in the order
    /// bit0 (paused), bit1 (error), bit2 (offline).  Anything else is unknown.
    pub fn from_status_bits(bits: u32) -> Self {
        if bits == 0 {
            Self::Online
        } else if bits & 0x1 != 0 {
            Self::Paused
        } else if bits & 0x2 != 0 {
            Self::Error
        } else if bits & 0x4 != 0 {
            Self::Offline
        } else {
            Self::Unknown
        }
    }

    /// Human-readable message attached to non-online states.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Online => None,
            Self::Paused => Some("printer paused"),
            Self::Error => Some("printer reported an error"),
            Self::Offline => Some("printer offline"),
            Self::Unknown => Some("printer status unknown"),
        }
    }
}

/// Point-in-time status of a printer.  Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatus {
    pub name: String,
    pub status: PrinterState,
    pub jobs_in_queue: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// Lifecycle states of a job held by the remote spooler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Printing,
    Paused,
    Error,
    Printed,
    Deleted,
}

impl JobState {
    /// Decode the spooler's job status bit field.
    ///
    /// Precedence (first match wins): bit0 paused, bit1 error, bit4 printing,
    /// bit7 deleted, bit8 printed; otherwise queued.
    pub fn from_status_bits(bits: u32) -> Self {
        if bits & 0x1 != 0 {
            Self::Paused
        } else if bits & 0x2 != 0 {
            Self::Error
        } else if bits & 0x10 != 0 {
            Self::Printing
        } else if bits & 0x80 != 0 {
            Self::Deleted
        } else if bits & 0x100 != 0 {
            Self::Printed
        } else {
            Self::Queued
        }
    }
}

/// A job observed in a remote printer queue.
///
/// `pages_printed` and `submitted_time` are not recoverable from the
/// management tool; they are reported as `0` and the observation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub job_id: u32,
    pub printer_name: String,
    pub user_name: String,
    pub document_name: String,
    pub total_pages: u32,
    pub pages_printed: u32,
    pub size: u64,
    pub status: JobState,
    pub submitted_time: DateTime<Utc>,
}

/// Capability variant of a printer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Discovery and submission only.
    TransferOnly,
    /// Every operation, including queue and printer management.
    FullManagement,
    /// Canned data, no external process.
    Mock,
}

impl Capability {
    pub fn supports(&self, operation: Operation) -> bool {
        match self {
            Self::FullManagement | Self::Mock => true,
            Self::TransferOnly => !operation.is_management(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransferOnly => "transfer-only",
            Self::FullManagement => "full-management",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed operation set of the adapter contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    ListPrinters,
    PrintTransfer,
    QueryStatus,
    ListJobs,
    CancelJob,
    PauseJob,
    ResumeJob,
    PausePrinter,
    ResumePrinter,
    ClearQueue,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::ListPrinters,
        Operation::PrintTransfer,
        Operation::QueryStatus,
        Operation::ListJobs,
        Operation::CancelJob,
        Operation::PauseJob,
        Operation::ResumeJob,
        Operation::PausePrinter,
        Operation::ResumePrinter,
        Operation::ClearQueue,
    ];

    /// Whether this operation inspects or mutates spooler state beyond
    /// discovery and submission.
    pub fn is_management(&self) -> bool {
        !matches!(self, Self::ListPrinters | Self::PrintTransfer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListPrinters => "listPrinters",
            Self::PrintTransfer => "printTransfer",
            Self::QueryStatus => "queryStatus",
            Self::ListJobs => "listJobs",
            Self::CancelJob => "cancelJob",
            Self::PauseJob => "pauseJob",
            Self::ResumeJob => "resumeJob",
            Self::PausePrinter => "pausePrinter",
            Self::ResumePrinter => "resumePrinter",
            Self::ClearQueue => "clearQueue",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document handed to an adapter for submission.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Transport-level queue name (never the cache identifier).
    pub queue: String,
    /// Base64-encoded document payload.
    pub file_base64: String,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub job_id: String,
    /// `false` when the id was synthesized locally and does not address a
    /// spooler job.
    pub spooler_assigned: bool,
}

impl TransferReceipt {
    pub fn synthesized(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            spooler_assigned: false,
        }
    }

    pub fn from_spooler(job_id: impl ToString) -> Self {
        Self {
            job_id: job_id.to_string(),
            spooler_assigned: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printer_status_bits() {
        assert_eq!(PrinterState::from_status_bits(0x0), PrinterState::Online);
        assert_eq!(PrinterState::from_status_bits(0x1), PrinterState::Paused);
        assert_eq!(PrinterState::from_status_bits(0x3), PrinterState::Paused);
        assert_eq!(PrinterState::from_status_bits(0x2), PrinterState::Error);
        assert_eq!(PrinterState::from_status_bits(0x4), PrinterState::Offline);
        assert_eq!(PrinterState::from_status_bits(0x400), PrinterState::Unknown);
    }

    #[test]
    fn job_status_bits_follow_precedence() {
        assert_eq!(JobState::from_status_bits(0x0), JobState::Queued);
        assert_eq!(JobState::from_status_bits(0x10), JobState::Printing);
        assert_eq!(JobState::from_status_bits(0x100), JobState::Printed);
        assert_eq!(JobState::from_status_bits(0x80), JobState::Deleted);
        // paused outranks printing
        assert_eq!(JobState::from_status_bits(0x11), JobState::Paused);
        // printing outranks printed
        assert_eq!(JobState::from_status_bits(0x110), JobState::Printing);
    }

    #[test]
    fn transfer_only_supports_discovery_and_submission() {
        let cap = Capability::TransferOnly;
        assert!(cap.supports(Operation::ListPrinters));
        assert!(cap.supports(Operation::PrintTransfer));
        for op in Operation::ALL.iter().filter(|op| op.is_management()) {
            assert!(!cap.supports(*op), "{op} should be unsupported");
        }
        assert!(Operation::ALL.iter().all(|op| Capability::FullManagement.supports(*op)));
    }

    #[test]
    fn cache_entry_wire_shape() {
        let entry = CacheEntry {
            printers: vec![CachedPrinter {
                id: "abc".into(),
                name: "HP-1".into(),
                uri: "smb://host/HP-1".into(),
                cached_at: Utc::now(),
            }],
            last_updated: Utc::now(),
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert!(json.get("lastUpdated").is_some());
        assert!(json["printers"][0].get("cachedAt").is_some());

        let back: CacheEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn status_serializes_uppercase() {
        let status = PrinterStatus {
            name: "HP-1".into(),
            status: PrinterState::Online,
            jobs_in_queue: 2,
            status_message: None,
        };
        let json = serde_json::to_string(&status).expect("serialize");
        assert!(json.contains("\"ONLINE\""));
        assert!(json.contains("\"jobsInQueue\":2"));
        assert!(!json.contains("statusMessage"));
    }
}

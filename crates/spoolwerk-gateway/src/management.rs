// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer management by stable identifier.
//
// Each call resolves the id through the directory, checks the adapter's
// capability up front, then forwards to the adapter by queue name.  Job
// state is never cached.

use serde::Serialize;
use tracing::{info, instrument};

use spoolwerk_cache::PrinterDirectory;
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{CachedPrinter, Operation, PrintJob, PrinterStatus};

/// Outcome of a single mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

/// Outcome of clearing a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearOutcome {
    pub canceled_count: usize,
    pub message: String,
}

#[derive(Clone)]
pub struct PrinterManager {
    directory: PrinterDirectory,
}

impl PrinterManager {
    pub fn new(directory: PrinterDirectory) -> Self {
        Self { directory }
    }

    /// Whether the configured adapter can perform `operation`.
    pub fn supports(&self, operation: Operation) -> bool {
        self.directory.adapter().supports(operation)
    }

    async fn resolve(&self, printer_id: &str, operation: Operation) -> Result<CachedPrinter> {
        let adapter = self.directory.adapter();
        if !adapter.supports(operation) {
            return Err(adapter.unsupported(operation));
        }
        self.directory
            .get_printer_by_id(printer_id)
            .await?
            .ok_or_else(|| SpoolwerkError::PrinterNotFound(printer_id.to_owned()))
    }

    #[instrument(skip(self))]
    pub async fn printer_status(&self, printer_id: &str) -> Result<PrinterStatus> {
        let printer = self.resolve(printer_id, Operation::QueryStatus).await?;
        self.directory.adapter().query_status(&printer.name).await
    }

    #[instrument(skip(self))]
    pub async fn queue(&self, printer_id: &str) -> Result<Vec<PrintJob>> {
        let printer = self.resolve(printer_id, Operation::ListJobs).await?;
        self.directory.adapter().list_jobs(&printer.name).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_job(&self, printer_id: &str, job_id: u32) -> Result<ActionOutcome> {
        let printer = self.resolve(printer_id, Operation::CancelJob).await?;
        let success = self.directory.adapter().cancel_job(&printer.name, job_id).await?;
        Ok(outcome(
            success,
            format!("job {job_id} cancelled"),
            format!("failed to cancel job {job_id}"),
        ))
    }

    #[instrument(skip(self))]
    pub async fn pause_job(&self, printer_id: &str, job_id: u32) -> Result<ActionOutcome> {
        let printer = self.resolve(printer_id, Operation::PauseJob).await?;
        let success = self.directory.adapter().pause_job(&printer.name, job_id).await?;
        Ok(outcome(
            success,
            format!("job {job_id} paused"),
            format!("failed to pause job {job_id}"),
        ))
    }

    #[instrument(skip(self))]
    pub async fn resume_job(&self, printer_id: &str, job_id: u32) -> Result<ActionOutcome> {
        let printer = self.resolve(printer_id, Operation::ResumeJob).await?;
        let success = self.directory.adapter().resume_job(&printer.name, job_id).await?;
        Ok(outcome(
            success,
            format!("job {job_id} resumed"),
            format!("failed to resume job {job_id}"),
        ))
    }

    #[instrument(skip(self))]
    pub async fn pause_printer(&self, printer_id: &str) -> Result<ActionOutcome> {
        let printer = self.resolve(printer_id, Operation::PausePrinter).await?;
        let success = self.directory.adapter().pause_printer(&printer.name).await?;
        Ok(outcome(
            success,
            format!("printer \"{}\" paused", printer.name),
            format!("failed to pause printer \"{}\"", printer.name),
        ))
    }

    #[instrument(skip(self))]
    pub async fn resume_printer(&self, printer_id: &str) -> Result<ActionOutcome> {
        let printer = self.resolve(printer_id, Operation::ResumePrinter).await?;
        let success = self.directory.adapter().resume_printer(&printer.name).await?;
        Ok(outcome(
            success,
            format!("printer \"{}\" resumed", printer.name),
            format!("failed to resume printer \"{}\"", printer.name),
        ))
    }

    #[instrument(skip(self))]
    pub async fn clear_queue(&self, printer_id: &str) -> Result<ClearOutcome> {
        let printer = self.resolve(printer_id, Operation::ClearQueue).await?;
        let canceled_count = self.directory.adapter().clear_queue(&printer.name).await?;
        info!(printer = %printer.name, canceled_count, "queue cleared");
        Ok(ClearOutcome {
            canceled_count,
            message: format!("{canceled_count} job(s) cancelled"),
        })
    }
}

fn outcome(success: bool, ok: String, failed: String) -> ActionOutcome {
    ActionOutcome {
        success,
        message: if success { ok } else { failed },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use spoolwerk_cache::{MemoryStore, printer_id};
    use spoolwerk_core::ErrorKind;
    use spoolwerk_core::config::{CacheConfig, GatewayConfig, TransportKind};
    use spoolwerk_core::types::PrinterState;
    use spoolwerk_print::{MockAdapter, PrinterAdapter, build_adapter};

    use super::*;

    fn manager_with(adapter: Arc<dyn PrinterAdapter>) -> PrinterManager {
        PrinterManager::new(PrinterDirectory::new(
            adapter,
            Arc::new(MemoryStore::new()),
            CacheConfig::default(),
        ))
    }

    #[tokio::test]
    async fn mock_management_round_trip() {
        let manager = manager_with(Arc::new(MockAdapter::new()));
        let id = printer_id("Mock Printer 1");

        let status = manager.printer_status(&id).await.expect("status");
        assert_eq!(status.status, PrinterState::Online);
        assert!(manager.queue(&id).await.expect("queue").is_empty());

        let paused = manager.pause_printer(&id).await.expect("pause");
        assert!(paused.success);
        assert_eq!(paused.message, "printer \"Mock Printer 1\" paused");

        let cancelled = manager.cancel_job(&id, 12).await.expect("cancel");
        assert_eq!(cancelled.message, "job 12 cancelled");

        let cleared = manager.clear_queue(&id).await.expect("clear");
        assert_eq!(cleared.canceled_count, 0);
        let json = serde_json::to_value(&cleared).expect("serialize");
        assert_eq!(json["canceledCount"], 0);
    }

    #[tokio::test]
    async fn unknown_printer_is_not_found() {
        let manager = manager_with(Arc::new(MockAdapter::new()));
        let err = manager.resume_job("0123456789abcdef", 1).await.expect_err("absent");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn capability_checked_before_lookup() {
        let config = GatewayConfig {
            transport: TransportKind::Lpd,
            host: "lpdhost".into(),
            ..GatewayConfig::default()
        };
        let manager = manager_with(build_adapter(&config));

        assert!(!manager.supports(Operation::ClearQueue));
        // An id that does not exist still reports unsupported, not not-found.
        let err = manager.clear_queue("0123456789abcdef").await.expect_err("unsupported");
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn failure_messages() {
        let failed = outcome(false, "ok".into(), "failed to pause job 3".into());
        assert!(!failed.success);
        assert_eq!(failed.message, "failed to pause job 3");
    }
}

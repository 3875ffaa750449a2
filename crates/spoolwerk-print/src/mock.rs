// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mock adapter — canned printers, no external processes.
//
// Used for development without a print server and as the adapter behind
// cache and dispatch tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use spoolwerk_core::error::Result;
use spoolwerk_core::types::{
    Capability, PrintJob, Printer, PrinterState, PrinterStatus, TransferReceipt, TransferRequest,
};

use crate::adapter::PrinterAdapter;
use crate::spool::decode_payload;

const MOCK_STATUS_MESSAGE: &str = "Mock status - always online";

/// Canned adapter that supports every operation.
pub struct MockAdapter {
    printers: Mutex<Vec<Printer>>,
    list_calls: AtomicUsize,
    print_calls: AtomicUsize,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAdapter {
    /// Two default printers, `mock://printer1` and `mock://printer2`.
    pub fn new() -> Self {
        Self::with_printers(vec![
            Printer::new("Mock Printer 1", "mock://printer1"),
            Printer::new("Mock Printer 2", "mock://printer2"),
        ])
    }

    pub fn with_printers(printers: Vec<Printer>) -> Self {
        Self {
            printers: Mutex::new(printers),
            list_calls: AtomicUsize::new(0),
            print_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_printer(&self, printer: Printer) {
        self.lock().push(printer);
    }

    pub fn clear_printers(&self) {
        self.lock().clear();
    }

    /// How many times `list_printers` has been called.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// How many documents have been accepted.
    pub fn print_calls(&self) -> usize {
        self.print_calls.load(Ordering::SeqCst)
    }

    // A poisoned lock only means a test panicked mid-push; the data is fine.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Printer>> {
        self.printers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PrinterAdapter for MockAdapter {
    fn transport(&self) -> &'static str {
        "mock"
    }

    fn capability(&self) -> Capability {
        Capability::Mock
    }

    async fn list_printers(&self) -> Result<Vec<Printer>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().clone())
    }

    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        decode_payload(&request.file_base64)?;
        self.print_calls.fetch_add(1, Ordering::SeqCst);
        let simple = Uuid::new_v4().simple().to_string();
        let job_id = format!("mock-job-{}", &simple[..8]);
        info!(queue = %request.queue, job_id = %job_id, "mock print accepted");
        Ok(TransferReceipt::synthesized(job_id))
    }

    async fn query_status(&self, printer: &str) -> Result<PrinterStatus> {
        Ok(PrinterStatus {
            name: printer.to_owned(),
            status: PrinterState::Online,
            jobs_in_queue: 0,
            status_message: Some(MOCK_STATUS_MESSAGE.to_owned()),
        })
    }

    async fn list_jobs(&self, _printer: &str) -> Result<Vec<PrintJob>> {
        Ok(Vec::new())
    }

    async fn cancel_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Ok(true)
    }

    async fn pause_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Ok(true)
    }

    async fn resume_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Ok(true)
    }

    async fn pause_printer(&self, _printer: &str) -> Result<bool> {
        Ok(true)
    }

    async fn resume_printer(&self, _printer: &str) -> Result<bool> {
        Ok(true)
    }

    async fn clear_queue(&self, _printer: &str) -> Result<usize> {
        Ok(0)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print dispatch — resolve a printer id through the directory and hand the
// document to the adapter.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use spoolwerk_cache::PrinterDirectory;
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::TransferRequest;

/// Inbound print request, as accepted by every submission boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    #[serde(default)]
    pub printer_id: String,
    #[serde(default)]
    pub file_base64: String,
}

impl PrintRequest {
    pub fn validate(&self) -> Result<()> {
        if self.printer_id.trim().is_empty() {
            return Err(SpoolwerkError::Validation("printerId is required".into()));
        }
        if self.file_base64.trim().is_empty() {
            return Err(SpoolwerkError::Validation("fileBase64 is required".into()));
        }
        Ok(())
    }
}

/// Result of a dispatched print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    pub job_id: String,
    pub printer_name: String,
    /// Whether `job_id` addresses a job in the remote spooler.
    pub spooler_assigned: bool,
    pub simulated: bool,
}

/// Optional dry-run: skip the adapter and answer after a delay.
#[derive(Debug, Clone, Copy)]
pub struct Simulation {
    pub delay: Duration,
}

#[derive(Clone)]
pub struct PrintDispatcher {
    directory: PrinterDirectory,
    simulation: Option<Simulation>,
}

impl PrintDispatcher {
    pub fn new(directory: PrinterDirectory, simulation: Option<Simulation>) -> Self {
        Self {
            directory,
            simulation,
        }
    }

    #[instrument(skip(self, request), fields(printer_id = %request.printer_id))]
    pub async fn print(&self, request: PrintRequest) -> Result<PrintResponse> {
        request.validate()?;
        let printer = self.directory.resolve_for_dispatch(request.printer_id.trim()).await?;

        if let Some(simulation) = self.simulation {
            tokio::time::sleep(simulation.delay).await;
            let job_id = format!("sim-{}", Uuid::new_v4());
            info!(printer = %printer.name, job_id = %job_id, "simulated print");
            return Ok(PrintResponse {
                job_id,
                printer_name: printer.name,
                spooler_assigned: false,
                simulated: true,
            });
        }

        let receipt = self
            .directory
            .adapter()
            .print_transfer(TransferRequest {
                queue: printer.name.clone(),
                file_base64: request.file_base64,
            })
            .await?;

        info!(printer = %printer.name, job_id = %receipt.job_id, "print dispatched");
        Ok(PrintResponse {
            job_id: receipt.job_id,
            printer_name: printer.name,
            spooler_assigned: receipt.spooler_assigned,
            simulated: false,
        })
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rpcclient transport — full queue and printer management over MS-RPC.
//
// Every operation is one `rpcclient -U <auth> //<host> -c "<command>"`
// invocation.  Submission itself goes through smbclient (rpcclient cannot
// upload documents); afterwards the queue is scanned so the receipt can
// carry the spooler's own job number when it is visible.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use spoolwerk_core::error::Result;
use spoolwerk_core::types::{Capability, PrintJob, Printer, PrinterStatus, TransferReceipt, TransferRequest};

use crate::adapter::PrinterAdapter;
use crate::parser;
use crate::runner::CommandRunner;
use crate::smb_client::{SmbCredentials, check_queue_name, submit_document};

pub const RPCCLIENT: &str = "rpcclient";

/// `setjob` command codes.
const JOB_PAUSE: u8 = 1;
const JOB_RESUME: u8 = 2;
const JOB_CANCEL: u8 = 4;

/// `setprinter` command codes.
const PRINTER_PAUSE: u8 = 1;
const PRINTER_RESUME: u8 = 2;

/// Full-management adapter backed by `rpcclient` (and `smbclient` for
/// submission).
pub struct RpcAdapter {
    credentials: SmbCredentials,
    runner: Arc<dyn CommandRunner>,
    spool_dir: PathBuf,
}

impl RpcAdapter {
    pub fn new(credentials: SmbCredentials, runner: Arc<dyn CommandRunner>, spool_dir: PathBuf) -> Self {
        Self {
            credentials,
            runner,
            spool_dir,
        }
    }

    fn args(&self, command: String) -> Vec<String> {
        vec![
            "-U".to_owned(),
            self.credentials.domain_auth(),
            format!("//{}", self.credentials.host),
            "-c".to_owned(),
            command,
        ]
    }

    /// Run a query command; non-zero exit is a transport error.
    async fn query(&self, command: String) -> Result<String> {
        let args = self.args(command);
        self.runner.run(RPCCLIENT, &args).await?.into_stdout(RPCCLIENT)
    }

    /// Run a mutation command; any failure is logged and reported as `false`.
    async fn mutate(&self, command: String) -> bool {
        let args = self.args(command.clone());
        match self.runner.run(RPCCLIENT, &args).await {
            Ok(output) if output.success() => {
                debug!(command = %command, "rpcclient mutation applied");
                true
            }
            Ok(output) => {
                warn!(
                    command = %command,
                    exit_code = output.exit_code,
                    stderr = %output.stderr.trim(),
                    "rpcclient mutation rejected"
                );
                false
            }
            Err(e) => {
                warn!(command = %command, error = %e, "rpcclient mutation failed");
                false
            }
        }
    }

    async fn set_job(&self, printer: &str, job_id: u32, code: u8) -> Result<bool> {
        check_queue_name(printer)?;
        Ok(self.mutate(format!("setjob \"{printer}\" {job_id} {code}")).await)
    }

    async fn set_printer(&self, printer: &str, code: u8) -> Result<bool> {
        check_queue_name(printer)?;
        Ok(self.mutate(format!("setprinter \"{printer}\" {code}")).await)
    }
}

#[async_trait]
impl PrinterAdapter for RpcAdapter {
    fn transport(&self) -> &'static str {
        "rpc"
    }

    fn capability(&self) -> Capability {
        Capability::FullManagement
    }

    #[instrument(skip(self), fields(host = %self.credentials.host))]
    async fn list_printers(&self) -> Result<Vec<Printer>> {
        let stdout = self.query("enumprinters".to_owned()).await?;
        let printers = parser::parse_printer_list(&stdout, &self.credentials.host);
        info!(count = printers.len(), "enumerated printers");
        Ok(printers)
    }

    #[instrument(skip(self, request), fields(queue = %request.queue))]
    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let job_name =
            submit_document(self.runner.as_ref(), &self.credentials, &self.spool_dir, &request).await?;

        // Best effort: the job may already have printed, or the queue may be
        // unreadable.  Either way the transfer itself succeeded.
        let receipt = match self.list_jobs(&request.queue).await {
            Ok(jobs) => match jobs.iter().find(|job| job.document_name.contains(&job_name)) {
                Some(job) => TransferReceipt::from_spooler(job.job_id),
                None => TransferReceipt::synthesized(job_name),
            },
            Err(e) => {
                debug!(error = %e, "could not correlate spooler job id");
                TransferReceipt::synthesized(job_name)
            }
        };
        info!(
            job_id = %receipt.job_id,
            spooler_assigned = receipt.spooler_assigned,
            "document transferred"
        );
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn query_status(&self, printer: &str) -> Result<PrinterStatus> {
        check_queue_name(printer)?;
        let stdout = self.query(format!("getprinter \"{printer}\"")).await?;
        let reading = parser::parse_printer_status(&stdout);
        let jobs_in_queue = self.list_jobs(printer).await?.len();

        Ok(PrinterStatus {
            name: printer.to_owned(),
            status: reading.state,
            jobs_in_queue,
            status_message: reading.message,
        })
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, printer: &str) -> Result<Vec<PrintJob>> {
        check_queue_name(printer)?;
        let stdout = self.query(format!("enumjobs \"{printer}\"")).await?;
        Ok(parser::parse_jobs(&stdout, printer, Utc::now()))
    }

    async fn cancel_job(&self, printer: &str, job_id: u32) -> Result<bool> {
        self.set_job(printer, job_id, JOB_CANCEL).await
    }

    async fn pause_job(&self, printer: &str, job_id: u32) -> Result<bool> {
        self.set_job(printer, job_id, JOB_PAUSE).await
    }

    async fn resume_job(&self, printer: &str, job_id: u32) -> Result<bool> {
        self.set_job(printer, job_id, JOB_RESUME).await
    }

    async fn pause_printer(&self, printer: &str) -> Result<bool> {
        self.set_printer(printer, PRINTER_PAUSE).await
    }

    async fn resume_printer(&self, printer: &str) -> Result<bool> {
        self.set_printer(printer, PRINTER_RESUME).await
    }

    #[instrument(skip(self))]
    async fn clear_queue(&self, printer: &str) -> Result<usize> {
        let jobs = self.list_jobs(printer).await?;
        let total = jobs.len();

        let mut cancelled = 0;
        for job in jobs {
            if self.cancel_job(printer, job.job_id).await? {
                cancelled += 1;
            }
        }
        info!(cancelled, total, "queue cleared");
        Ok(cancelled)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer adapter contract and the factory that picks an implementation.
//
// The operation set is fixed.  An adapter advertises a `Capability`; any
// operation outside it resolves to `SpoolwerkError::Unsupported` via the
// default method bodies, never to a silent success.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use spoolwerk_core::config::{GatewayConfig, TransportKind};
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{
    Capability, Operation, PrintJob, Printer, PrinterStatus, TransferReceipt, TransferRequest,
};

use crate::ipp_client::IppTransferAdapter;
use crate::lpr_client::LpdTransferAdapter;
use crate::mock::MockAdapter;
use crate::rpc_client::RpcAdapter;
use crate::runner::{CommandRunner, ProcessRunner};
use crate::smb_client::{SmbCredentials, SmbTransferAdapter};

/// Uniform interface over print transports.
///
/// Printers are addressed by transport-level queue name here; translating
/// stable ids into names is the caller's job.
#[async_trait]
pub trait PrinterAdapter: Send + Sync {
    /// Short transport label used in logs and errors (`"smb"`, `"ipp"`, ...).
    fn transport(&self) -> &'static str;

    fn capability(&self) -> Capability;

    fn supports(&self, operation: Operation) -> bool {
        self.capability().supports(operation)
    }

    /// The error returned for an operation outside this adapter's capability.
    fn unsupported(&self, operation: Operation) -> SpoolwerkError {
        warn!(
            transport = self.transport(),
            operation = operation.as_str(),
            "operation not supported by adapter"
        );
        SpoolwerkError::Unsupported {
            operation,
            transport: self.transport(),
            supported_by: Capability::FullManagement,
        }
    }

    async fn list_printers(&self) -> Result<Vec<Printer>>;

    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt>;

    async fn query_status(&self, _printer: &str) -> Result<PrinterStatus> {
        Err(self.unsupported(Operation::QueryStatus))
    }

    async fn list_jobs(&self, _printer: &str) -> Result<Vec<PrintJob>> {
        Err(self.unsupported(Operation::ListJobs))
    }

    async fn cancel_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Err(self.unsupported(Operation::CancelJob))
    }

    async fn pause_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Err(self.unsupported(Operation::PauseJob))
    }

    async fn resume_job(&self, _printer: &str, _job_id: u32) -> Result<bool> {
        Err(self.unsupported(Operation::ResumeJob))
    }

    async fn pause_printer(&self, _printer: &str) -> Result<bool> {
        Err(self.unsupported(Operation::PausePrinter))
    }

    async fn resume_printer(&self, _printer: &str) -> Result<bool> {
        Err(self.unsupported(Operation::ResumePrinter))
    }

    /// Cancel every job in the queue; returns how many cancellations
    /// succeeded.
    async fn clear_queue(&self, _printer: &str) -> Result<usize> {
        Err(self.unsupported(Operation::ClearQueue))
    }
}

/// Build the adapter selected by `config.transport`.
pub fn build_adapter(config: &GatewayConfig) -> Arc<dyn PrinterAdapter> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(config.command_timeout()));
    build_adapter_with_runner(config, runner)
}

/// As [`build_adapter`], with an explicit command runner for the SMB
/// variants.
pub fn build_adapter_with_runner(
    config: &GatewayConfig,
    runner: Arc<dyn CommandRunner>,
) -> Arc<dyn PrinterAdapter> {
    let adapter: Arc<dyn PrinterAdapter> = match config.transport {
        TransportKind::Smb => Arc::new(SmbTransferAdapter::new(
            SmbCredentials::from_config(config),
            runner,
            config.spool_dir.clone(),
        )),
        TransportKind::Rpc => Arc::new(RpcAdapter::new(
            SmbCredentials::from_config(config),
            runner,
            config.spool_dir.clone(),
        )),
        TransportKind::Ipp => Arc::new(IppTransferAdapter::new(&config.host, config.ipp_port)),
        TransportKind::Lpd => Arc::new(LpdTransferAdapter::new(
            &config.host,
            config.lpd_port,
            config.lpd_queues.clone(),
        )),
        TransportKind::Mock => Arc::new(MockAdapter::new()),
    };
    info!(
        transport = adapter.transport(),
        capability = %adapter.capability(),
        "printer adapter ready"
    );
    adapter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_selects_by_transport() {
        let mut config = GatewayConfig {
            host: "printsrv".into(),
            ..GatewayConfig::default()
        };

        let cases = [
            (TransportKind::Rpc, "rpc", Capability::FullManagement),
            (TransportKind::Smb, "smb", Capability::TransferOnly),
            (TransportKind::Ipp, "ipp", Capability::TransferOnly),
            (TransportKind::Lpd, "lpd", Capability::TransferOnly),
            (TransportKind::Mock, "mock", Capability::Mock),
        ];
        for (kind, label, capability) in cases {
            config.transport = kind;
            let adapter = build_adapter(&config);
            assert_eq!(adapter.transport(), label);
            assert_eq!(adapter.capability(), capability);
        }
    }

    #[tokio::test]
    async fn transfer_only_variants_reject_management() {
        let config = GatewayConfig {
            transport: TransportKind::Ipp,
            host: "cups.local".into(),
            ..GatewayConfig::default()
        };
        let adapter = build_adapter(&config);

        assert!(!adapter.supports(Operation::PauseJob));
        let err = adapter.pause_job("HP-1", 3).await.expect_err("unsupported");
        match err {
            SpoolwerkError::Unsupported {
                operation,
                transport,
                supported_by,
            } => {
                assert_eq!(operation, Operation::PauseJob);
                assert_eq!(transport, "ipp");
                assert_eq!(supported_by, Capability::FullManagement);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(adapter.clear_queue("HP-1").await.is_err());
        assert!(adapter.query_status("HP-1").await.is_err());
    }
}

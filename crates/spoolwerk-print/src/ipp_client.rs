// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP transport — transfer-only adapter for CUPS-style print servers.
//
// Uses the `ipp` crate's async API:
//   - CUPS-Get-Printers  (queue discovery)
//   - Print-Job          (RFC 8011 §4.2.1)
//
// Documents are streamed straight into the request; no spool file.

use std::io::Cursor;

use async_trait::async_trait;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{Capability, Printer, TransferReceipt, TransferRequest};

use crate::adapter::PrinterAdapter;
use crate::spool::decode_payload;

/// Transfer-only adapter speaking IPP to a print server.
pub struct IppTransferAdapter {
    host: String,
    port: u16,
}

impl IppTransferAdapter {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_owned(),
            port,
        }
    }

    /// `ipp://host:port/printers/<encoded-name>`, the CUPS queue layout.
    pub fn printer_uri(&self, name: &str) -> String {
        format!(
            "ipp://{}:{}/printers/{}",
            self.host,
            self.port,
            urlencoding::encode(name)
        )
    }

    fn server_uri(&self) -> Result<Uri> {
        parse_uri(&format!("ipp://{}:{}/", self.host, self.port))
    }
}

fn parse_uri(uri: &str) -> Result<Uri> {
    uri.parse()
        .map_err(|e| SpoolwerkError::Ipp(format!("invalid URI '{uri}': {e}")))
}

fn check_status(response: &IppRequestResponse, operation: &str) -> Result<()> {
    let code = response.header().status_code();
    if code.is_success() {
        Ok(())
    } else {
        error!(status = ?code, operation, "IPP request rejected");
        Err(SpoolwerkError::Ipp(format!("{operation} returned status {code:?}")))
    }
}

#[async_trait]
impl PrinterAdapter for IppTransferAdapter {
    fn transport(&self) -> &'static str {
        "ipp"
    }

    fn capability(&self) -> Capability {
        Capability::TransferOnly
    }

    #[instrument(skip(self), fields(host = %self.host, port = self.port))]
    async fn list_printers(&self) -> Result<Vec<Printer>> {
        let uri = self.server_uri()?;
        let request = IppRequestResponse::new(
            IppVersion::v1_1(),
            ipp::model::Operation::CupsGetPrinters,
            Some(uri.clone()),
        );

        debug!("sending CUPS-Get-Printers");
        let response = AsyncIppClient::new(uri)
            .send(request)
            .await
            .map_err(|e| SpoolwerkError::Ipp(format!("CUPS-Get-Printers: {e}")))?;
        check_status(&response, "CUPS-Get-Printers")?;

        let printers: Vec<Printer> = printer_names(response.attributes())
            .into_iter()
            .map(|name| {
                let uri = self.printer_uri(&name);
                Printer::new(name, uri)
            })
            .collect();
        info!(count = printers.len(), "listed IPP queues");
        Ok(printers)
    }

    #[instrument(skip(self, request), fields(queue = %request.queue))]
    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let bytes = decode_payload(&request.file_base64)?;
        let uri = parse_uri(&self.printer_uri(&request.queue))?;
        let job_title = format!("spoolwerk-{}", Uuid::new_v4());

        let operation = IppOperationBuilder::print_job(uri.clone(), IppPayload::new(Cursor::new(bytes)))
            .job_title(&job_title)
            .document_format("application/pdf")
            .build();

        info!(job_title = %job_title, "sending Print-Job");
        let response = AsyncIppClient::new(uri)
            .send(operation)
            .await
            .map_err(|e| SpoolwerkError::Ipp(format!("Print-Job: {e}")))?;
        check_status(&response, "Print-Job")?;

        let job_id = extract_job_id(response.attributes()).ok_or_else(|| {
            SpoolwerkError::Ipp("Print-Job response missing job-id attribute".into())
        })?;
        info!(job_id, "print job accepted by server");
        Ok(TransferReceipt::from_spooler(job_id))
    }
}

/// Every `printer-name` in the response's printer attribute groups.
fn printer_names(attrs: &IppAttributes) -> Vec<String> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| group.attributes().get("printer-name"))
        .map(|attr| format!("{}", attr.value()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract the `job-id` integer from a response's Job Attributes group.
fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    attrs
        .groups_of(DelimiterTag::JobAttributes)
        .filter_map(|group| group.attributes().get("job-id"))
        .find_map(|attr| match attr.value() {
            IppValue::Integer(id) => Some(*id),
            _ => None,
        })
}

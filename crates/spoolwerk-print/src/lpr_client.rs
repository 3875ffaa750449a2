// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// LPR/LPD transport (RFC 1179) — transfer-only adapter for legacy queues.
//
// The protocol is simple: open connection, send a control file (metadata),
// then send the data file (document bytes).  LPD has no discovery, so the
// configured queue names are reported as the printer list.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, instrument};
use uuid::Uuid;

use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{Capability, Printer, TransferReceipt, TransferRequest};

use crate::adapter::PrinterAdapter;
use crate::spool::decode_payload;

/// Connect timeout for LPR sessions.
const LPR_TIMEOUT_SECS: u64 = 60;

/// Name this client announces in control files.
const CLIENT_HOST: &str = "spoolwerk";

/// Transfer-only adapter speaking LPD.
pub struct LpdTransferAdapter {
    host: String,
    port: u16,
    queues: Vec<String>,
}

impl LpdTransferAdapter {
    pub fn new(host: &str, port: u16, queues: Vec<String>) -> Self {
        Self {
            host: host.to_owned(),
            port,
            queues,
        }
    }
}

#[async_trait]
impl PrinterAdapter for LpdTransferAdapter {
    fn transport(&self) -> &'static str {
        "lpd"
    }

    fn capability(&self) -> Capability {
        Capability::TransferOnly
    }

    async fn list_printers(&self) -> Result<Vec<Printer>> {
        Ok(self
            .queues
            .iter()
            .map(|queue| {
                Printer::new(
                    queue.as_str(),
                    format!("lpd://{}/{}", self.host, urlencoding::encode(queue)),
                )
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(queue = %request.queue))]
    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let bytes = decode_payload(&request.file_base64)?;
        // RFC 1179 job numbers are three digits.
        let job_num = (Uuid::new_v4().as_u128() % 1000) as u16;
        let job_name = format!("spoolwerk-{job_num:03}");

        send_lpr(&self.host, self.port, &request.queue, job_num, &job_name, &bytes).await?;
        Ok(TransferReceipt::synthesized(format!("lpd-{job_num:03}")))
    }
}

/// Send a document via LPR/LPD protocol.
///
/// Implements a minimal RFC 1179 client:
/// 1. Send "receive job" command (0x02)
/// 2. Send control file with job metadata
/// 3. Send data file with document bytes
pub async fn send_lpr(
    host: &str,
    port: u16,
    queue: &str,
    job_num: u16,
    job_name: &str,
    document_bytes: &[u8],
) -> Result<()> {
    if queue.is_empty() || queue.contains(|c: char| c.is_whitespace() || c.is_control()) {
        return Err(SpoolwerkError::Validation(format!("invalid LPD queue name: {queue:?}")));
    }

    let addr = format!("{host}:{port}");
    info!(addr = %addr, queue, job = job_name, "connecting via LPR");

    let mut stream = tokio::time::timeout(
        Duration::from_secs(LPR_TIMEOUT_SECS),
        TcpStream::connect(&addr),
    )
    .await
    .map_err(|_| {
        SpoolwerkError::Lpd(format!(
            "connection to {addr} timed out after {LPR_TIMEOUT_SECS}s"
        ))
    })?
    .map_err(|e| SpoolwerkError::Lpd(format!("connect to {addr}: {e}")))?;

    // 0x02 <queue> LF
    write(&mut stream, format!("\x02{queue}\n").as_bytes(), "receive-job command").await?;
    expect_ack(&mut stream, "receive-job command").await?;

    let control_file = format!(
        "H{CLIENT_HOST}\nP{CLIENT_HOST}\nJ{job_name}\nldfA{job_num:03}{CLIENT_HOST}\nUdfA{job_num:03}{CLIENT_HOST}\nN{job_name}\n"
    );
    let cf_header = format!("\x02{} cfA{job_num:03}{CLIENT_HOST}\n", control_file.len());
    write(&mut stream, cf_header.as_bytes(), "control header").await?;
    expect_ack(&mut stream, "control header").await?;
    write(&mut stream, control_file.as_bytes(), "control file").await?;
    write(&mut stream, &[0], "control terminator").await?;
    expect_ack(&mut stream, "control file").await?;

    let df_header = format!(
        "\x03{} dfA{job_num:03}{CLIENT_HOST}\n",
        document_bytes.len()
    );
    write(&mut stream, df_header.as_bytes(), "data header").await?;
    expect_ack(&mut stream, "data header").await?;
    write(&mut stream, document_bytes, "data file").await?;
    write(&mut stream, &[0], "data terminator").await?;
    expect_ack(&mut stream, "data file").await?;

    info!(job = job_name, bytes = document_bytes.len(), "LPR job sent");
    Ok(())
}

async fn write(stream: &mut TcpStream, bytes: &[u8], stage: &str) -> Result<()> {
    stream
        .write_all(bytes)
        .await
        .map_err(|e| SpoolwerkError::Lpd(format!("{stage}: {e}")))
}

/// Read one acknowledgement byte; anything but 0x00 is a rejection.
async fn expect_ack(stream: &mut TcpStream, stage: &str) -> Result<()> {
    let mut ack = [0u8; 1];
    stream
        .read_exact(&mut ack)
        .await
        .map_err(|e| SpoolwerkError::Lpd(format!("{stage} ack: {e}")))?;
    if ack[0] != 0 {
        return Err(SpoolwerkError::Lpd(format!(
            "printer rejected {stage} (ack 0x{:02x})",
            ack[0]
        )));
    }
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// smbclient transport — share listing and document submission over SMB.
//
// Transfer-only: smbclient can list printer shares and push a file into a
// queue, but cannot see or manage the jobs already there.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use spoolwerk_core::config::GatewayConfig;
use spoolwerk_core::error::{Result, SpoolwerkError};
use spoolwerk_core::types::{Capability, Printer, TransferReceipt, TransferRequest};

use crate::adapter::PrinterAdapter;
use crate::parser;
use crate::runner::CommandRunner;
use crate::spool::{SpoolFile, decode_payload};

pub const SMBCLIENT: &str = "smbclient";

/// Connection details shared by the SMB-based adapters.
#[derive(Clone)]
pub struct SmbCredentials {
    pub host: String,
    pub user: String,
    pub password: String,
    pub domain: Option<String>,
    pub dialect: Option<String>,
}

impl std::fmt::Debug for SmbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmbCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl SmbCredentials {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            domain: config.domain.clone(),
            dialect: config.dialect.clone(),
        }
    }

    /// `user%password`.
    pub fn user_auth(&self) -> String {
        format!("{}%{}", self.user, self.password)
    }

    /// `DOMAIN\user%password` when a domain is set, else `user%password`.
    pub fn domain_auth(&self) -> String {
        match self.domain.as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => format!("{domain}\\{}", self.user_auth()),
            None => self.user_auth(),
        }
    }

    /// Trailing `-m <dialect>` / `-W <domain>` flags for smbclient.
    fn smbclient_flags(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(dialect) = self.dialect.as_deref().filter(|d| !d.is_empty()) {
            args.push("-m".to_owned());
            args.push(dialect.to_owned());
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            args.push("-W".to_owned());
            args.push(domain.to_owned());
        }
        args
    }
}

/// Reject queue names that would break out of the tool's quoted command
/// argument.
pub(crate) fn check_queue_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SpoolwerkError::Validation("printer name is empty".into()));
    }
    if name.contains(['"', '\n', '\r', ';']) {
        return Err(SpoolwerkError::Validation(format!(
            "printer name contains characters that cannot be passed to the SMB tools: {name:?}"
        )));
    }
    Ok(())
}

/// Write the payload to a spool file, push it with `smbclient ... -c "print
/// <file>"`, and release the file whatever the outcome.
///
/// Returns the spool file's job name, which is the only handle smbclient
/// gives us.
pub(crate) async fn submit_document(
    runner: &dyn CommandRunner,
    credentials: &SmbCredentials,
    spool_dir: &std::path::Path,
    request: &TransferRequest,
) -> Result<String> {
    check_queue_name(&request.queue)?;
    let dir = spool_dir.display().to_string();
    if dir.contains(['"', '\n', '\r']) {
        return Err(SpoolwerkError::Validation(format!(
            "spool directory cannot be quoted for smbclient: {dir:?}"
        )));
    }
    let bytes = decode_payload(&request.file_base64)?;
    let spool = SpoolFile::create(spool_dir, bytes).await?;

    let mut args = vec![
        format!("//{}/{}", credentials.host, request.queue),
        "-U".to_owned(),
        credentials.user_auth(),
        "-c".to_owned(),
        format!("print \"{}\"", spool.path().display()),
    ];
    args.extend(credentials.smbclient_flags());

    let outcome = runner.run(SMBCLIENT, &args).await;
    let job_name = spool.job_name().to_owned();
    spool.release();

    let output = outcome?;
    if !output.success() {
        return Err(output.failure(SMBCLIENT));
    }
    Ok(job_name)
}

/// Transfer-only adapter backed by `smbclient`.
pub struct SmbTransferAdapter {
    credentials: SmbCredentials,
    runner: Arc<dyn CommandRunner>,
    spool_dir: PathBuf,
}

impl SmbTransferAdapter {
    pub fn new(credentials: SmbCredentials, runner: Arc<dyn CommandRunner>, spool_dir: PathBuf) -> Self {
        Self {
            credentials,
            runner,
            spool_dir,
        }
    }
}

#[async_trait]
impl PrinterAdapter for SmbTransferAdapter {
    fn transport(&self) -> &'static str {
        "smb"
    }

    fn capability(&self) -> Capability {
        Capability::TransferOnly
    }

    #[instrument(skip(self), fields(host = %self.credentials.host))]
    async fn list_printers(&self) -> Result<Vec<Printer>> {
        let mut args = vec![
            "-L".to_owned(),
            format!("//{}", self.credentials.host),
            "-U".to_owned(),
            self.credentials.user_auth(),
        ];
        args.extend(self.credentials.smbclient_flags());

        let stdout = self.runner.run(SMBCLIENT, &args).await?.into_stdout(SMBCLIENT)?;
        let printers = parser::parse_share_list(&stdout, &self.credentials.host);
        info!(count = printers.len(), "listed printer shares");
        Ok(printers)
    }

    #[instrument(skip(self, request), fields(queue = %request.queue))]
    async fn print_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let job_name =
            submit_document(self.runner.as_ref(), &self.credentials, &self.spool_dir, &request).await?;
        info!(job = %job_name, "document transferred");
        Ok(TransferReceipt::synthesized(job_name))
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spool files — scoped temporary copies of a document handed to smbclient.
//
// The file lives exactly as long as the `SpoolFile` value.  Dropping it (on
// success, on error, on task cancellation) removes the file.

use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use spoolwerk_core::error::{Result, SpoolwerkError};

/// Decode a base64 document payload.  Whitespace (line-wrapped base64) is
/// tolerated; an empty or undecodable payload is a validation error.
pub fn decode_payload(file_base64: &str) -> Result<Vec<u8>> {
    let compact: String = file_base64.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(SpoolwerkError::Validation("fileBase64 is empty".into()));
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| SpoolwerkError::Validation(format!("fileBase64 is not valid base64: {e}")))?;
    if bytes.is_empty() {
        return Err(SpoolwerkError::Validation("decoded document is empty".into()));
    }
    Ok(bytes)
}

/// A document written to the spool directory as `job-<uuid>.pdf`.
#[derive(Debug)]
pub struct SpoolFile {
    file: NamedTempFile,
    job_name: String,
}

impl SpoolFile {
    /// Write `bytes` into a fresh file under `dir`, creating `dir` if needed.
    pub async fn create(dir: &Path, bytes: Vec<u8>) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let dir: PathBuf = dir.to_path_buf();
        let job_name = format!("job-{}", Uuid::new_v4());
        let prefix = job_name.clone();

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".pdf")
                .rand_bytes(0)
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| SpoolwerkError::Io(std::io::Error::other(e)))??;

        debug!(path = %file.path().display(), "spool file written");
        Ok(Self { file, job_name })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// File stem, e.g. `job-2f1c…`.  Doubles as the synthetic job id.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Remove the file now, logging (not failing) if removal goes wrong.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "failed to remove spool file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_wrapped_base64() {
        let bytes = decode_payload("JVBERi0x\nLjQK").expect("decode");
        assert_eq!(bytes, b"%PDF-1.4\n");
    }

    #[test]
    fn decode_rejects_garbage_and_empty() {
        let err = decode_payload("not base64!!").expect_err("garbage");
        assert!(matches!(err, SpoolwerkError::Validation(_)));
        let err = decode_payload("  ").expect_err("empty");
        assert!(matches!(err, SpoolwerkError::Validation(_)));
    }

    #[tokio::test]
    async fn spool_file_lifecycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spool_dir = dir.path().join("prints");

        let spool = SpoolFile::create(&spool_dir, b"%PDF-1.4".to_vec())
            .await
            .expect("create");
        let path = spool.path().to_path_buf();
        assert!(path.exists());
        assert!(spool.job_name().starts_with("job-"));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("{}.pdf", spool.job_name()).as_str())
        );
        assert_eq!(std::fs::read(&path).expect("read"), b"%PDF-1.4");

        spool.release();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_removes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = {
            let spool = SpoolFile::create(dir.path(), vec![1, 2, 3]).await.expect("create");
            spool.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inbound submission boundary.
//
// Request/response callers and message-queue consumers both end up in
// `SubmissionHandler`, so both see the same outcome shape:
//
//   {"status":"success","jobId":"...","processedAt":"..."}
//   {"status":"error","kind":"not_found","message":"..."}

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use spoolwerk_core::error::{Result, SpoolwerkError};

use crate::dispatch::{PrintDispatcher, PrintRequest};

/// Decoding of raw queue messages into print requests.
pub struct Submission;

impl Submission {
    /// Accepts any of:
    /// - the request object itself: `{"printerId": .., "fileBase64": ..}`
    /// - `{"value": {..request..}}`
    /// - `{"value": "<request as JSON text>"}`
    /// - `{"value": {"type": "Buffer", "data": [..bytes..]}}` (a serialized
    ///   byte buffer holding the request JSON)
    pub fn from_message(bytes: &[u8]) -> Result<PrintRequest> {
        let message: Value = serde_json::from_slice(bytes)
            .map_err(|e| SpoolwerkError::Validation(format!("message is not valid JSON: {e}")))?;
        Self::from_value(message)
    }

    fn from_value(message: Value) -> Result<PrintRequest> {
        let body = match message {
            Value::Object(mut map) if map.contains_key("value") => {
                unwrap_envelope(map.remove("value").unwrap_or(Value::Null))?
            }
            other => other,
        };
        if !body.is_object() {
            return Err(SpoolwerkError::Validation(
                "message body must be a JSON object".into(),
            ));
        }
        serde_json::from_value(body)
            .map_err(|e| SpoolwerkError::Validation(format!("malformed print request: {e}")))
    }
}

fn unwrap_envelope(value: Value) -> Result<Value> {
    match value {
        Value::String(text) => serde_json::from_str(&text).map_err(|e| {
            SpoolwerkError::Validation(format!("message value is not valid JSON: {e}"))
        }),
        Value::Object(ref map) if map.get("type").and_then(Value::as_str) == Some("Buffer") => {
            let bytes: Vec<u8> = map
                .get("data")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| SpoolwerkError::Validation(format!("malformed buffer data: {e}")))?
                .unwrap_or_default();
            serde_json::from_slice(&bytes).map_err(|e| {
                SpoolwerkError::Validation(format!("buffer does not hold valid JSON: {e}"))
            })
        }
        other => Ok(other),
    }
}

/// Uniform result returned by every submission boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Success {
        #[serde(rename = "jobId")]
        job_id: String,
        #[serde(rename = "processedAt")]
        processed_at: DateTime<Utc>,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn from_error(err: &SpoolwerkError) -> Self {
        Self::Error {
            kind: err.kind().as_str(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Clone)]
pub struct SubmissionHandler {
    dispatcher: PrintDispatcher,
}

impl SubmissionHandler {
    pub fn new(dispatcher: PrintDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Synchronous boundary: an already-decoded request.
    #[instrument(skip(self, request), fields(printer_id = %short_id(&request.printer_id)))]
    pub async fn handle(&self, request: PrintRequest) -> SubmissionOutcome {
        let started = Instant::now();
        match self.dispatcher.print(request).await {
            Ok(response) => {
                info!(
                    job_id = %response.job_id,
                    elapsed_ms = started.elapsed().as_millis(),
                    "submission processed"
                );
                SubmissionOutcome::Success {
                    job_id: response.job_id,
                    processed_at: Utc::now(),
                }
            }
            Err(e) => {
                error!(
                    kind = e.kind().as_str(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis(),
                    "submission failed"
                );
                SubmissionOutcome::from_error(&e)
            }
        }
    }

    /// Asynchronous boundary: a raw queue message.
    pub async fn handle_message(&self, bytes: &[u8]) -> SubmissionOutcome {
        match Submission::from_message(bytes) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                error!(error = %e, "rejected undecodable message");
                SubmissionOutcome::from_error(&e)
            }
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

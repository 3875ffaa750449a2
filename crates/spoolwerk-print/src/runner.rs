// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command runner — executes one external tool invocation per call.
//
// stdin is closed, stdout/stderr are captured as text.  A non-zero exit is
// NOT an error at this layer; callers decide what success means.  Only a
// spawn failure (or an opt-in timeout) surfaces as `Err`.  No pooling: every
// call is one OS process.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use spoolwerk_core::error::{Result, SpoolwerkError};

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero exit into a transport failure carrying the raw
    /// stderr (or stdout when the tool reported on stdout only).
    pub fn failure(&self, program: &str) -> SpoolwerkError {
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        SpoolwerkError::CommandFailed {
            program: program.to_owned(),
            code: self.exit_code,
            stderr: detail.to_owned(),
        }
    }

    /// Return stdout when the process succeeded, else the failure.
    pub fn into_stdout(self, program: &str) -> Result<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(self.failure(program))
        }
    }
}

/// Seam between adapters and the operating system, so parsing and adapter
/// logic can be exercised without spawning processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands as real child processes via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    // Arguments are never logged: they carry credentials.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program, argc = args.len(), "spawning");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpoolwerkError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    warn!(program, timeout_ms = limit.as_millis(), "command timed out, killed");
                    SpoolwerkError::CommandTimeout {
                        program: program.to_owned(),
                        after: limit,
                    }
                })?,
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| SpoolwerkError::Spawn {
            program: program.to_owned(),
            source,
        })?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program, exit_code = result.exit_code, "process exited");
        Ok(result)
    }
}

/// Scripted runner for adapter tests: replies by `-c` command text.
#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct ScriptedRunner {
        replies: Mutex<HashMap<String, CommandOutput>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl ScriptedRunner {
        pub fn reply(self, command: &str, exit_code: i32, stdout: &str) -> Self {
            self.replies
                .lock()
                .expect("replies lock")
                .insert(
                    command.to_owned(),
                    CommandOutput {
                        exit_code,
                        stdout: stdout.to_owned(),
                        stderr: if exit_code == 0 {
                            String::new()
                        } else {
                            format!("scripted failure for {command}")
                        },
                    },
                );
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().expect("calls lock").clone()
        }

        /// The `-c` payload of every call, in order.
        pub fn commands(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .map(|(_, args)| command_key(&args))
                .collect()
        }
    }

    fn command_key(args: &[String]) -> String {
        args.iter()
            .position(|a| a == "-c")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| args.join(" "))
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((program.to_owned(), args.to_vec()));

            let key = command_key(args);
            let replies = self.replies.lock().expect("replies lock");
            // Print commands carry a random spool path; match them by prefix.
            let reply = replies.get(&key).cloned().or_else(|| {
                replies
                    .iter()
                    .find(|(k, _)| k.ends_with('*') && key.starts_with(k.trim_end_matches('*')))
                    .map(|(_, v)| v.clone())
            });
            Ok(reply.unwrap_or(CommandOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("unscripted command: {key}"),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_prefers_stderr() {
        let out = CommandOutput {
            exit_code: 1,
            stdout: "partial".into(),
            stderr: "NT_STATUS_ACCESS_DENIED\n".into(),
        };
        match out.failure("rpcclient") {
            SpoolwerkError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 1);
                assert_eq!(stderr, "NT_STATUS_ACCESS_DENIED");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failure_falls_back_to_stdout() {
        let out = CommandOutput {
            exit_code: 2,
            stdout: "Connection to printsrv failed".into(),
            stderr: "   ".into(),
        };
        assert!(out.failure("smbclient").to_string().contains("Connection to printsrv failed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_resolves() {
        let runner = ProcessRunner::default();
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let out = runner.run("sh", &args).await.expect("spawned");
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert!(out.into_stdout("sh").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdin_is_closed() {
        let runner = ProcessRunner::default();
        // `cat` exits immediately on a closed stdin instead of hanging.
        let out = runner.run("cat", &[]).await.expect("spawned");
        assert!(out.success());
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let runner = ProcessRunner::default();
        let err = runner
            .run("spoolwerk-definitely-not-installed", &[])
            .await
            .expect_err("should not spawn");
        assert!(matches!(err, SpoolwerkError::Spawn { .. }));
        assert!(err.is_transport());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_hung_command() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(100)));
        let args = vec!["5".to_string()];
        let err = runner.run("sleep", &args).await.expect_err("should time out");
        assert!(matches!(err, SpoolwerkError::CommandTimeout { .. }));
    }
}

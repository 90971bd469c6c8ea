//! External command execution.
//!
//! [`CommandRunner`] is the seam every external tool invocation goes through.
//! [`ProcessRunner`] spawns real processes with `tokio::process`; tests inject
//! [`crate::fakes::ScriptedRunner`] instead.
//!
//! When verbose mode is on, each invocation is announced on the output sink as
//! `Executing: <program> <args> in <dir>`. Long arguments are summarized in
//! that line only (see [`summarize_args`]); the process always receives the
//! full argument list.

use std::io::{self, Write};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Arguments longer than this many bytes are replaced in invocation traces.
pub const MAX_TRACED_ARG_LEN: usize = 30;

/// Placeholder written in place of a long argument.
pub const REDACTED_ARG: &str = "...";

/// Errors produced while running an external command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Non-zero exit of a streamed command; its stderr already went to the sink.
    #[error("`{program}` failed: {status}")]
    Status { program: String, status: ExitStatus },

    /// Non-zero exit of a captured command, carrying the captured stderr.
    #[error("error: {status}. Stderr: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("failed to write command output: {0}")]
    Sink(#[source] io::Error),
}

impl ExecError {
    /// Standard error captured from a failed [`CommandRunner::execute_and_capture`].
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecError::Exit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Runs external programs on behalf of the rest of the crate.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` in `working_dir`, forwarding stdout and stderr to
    /// `output` as they are produced.
    async fn execute(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError>;

    /// Run `program` in `working_dir` and return its stdout.
    ///
    /// On a non-zero exit the error is [`ExecError::Exit`], whose
    /// [`ExecError::stderr`] holds what the process wrote to stderr.
    async fn execute_and_capture(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<String, ExecError>;

    fn set_verbose(&self, verbose: bool);

    fn is_verbose(&self) -> bool;
}

/// Replace every argument longer than [`MAX_TRACED_ARG_LEN`] with
/// [`REDACTED_ARG`], keeping the count and order of arguments.
pub fn summarize_args<'a>(args: &[&'a str]) -> Vec<&'a str> {
    args.iter()
        .map(|arg| {
            if arg.len() > MAX_TRACED_ARG_LEN {
                REDACTED_ARG
            } else {
                *arg
            }
        })
        .collect()
}

/// The line written to the sink before running a command in verbose mode.
pub fn invocation_line(program: &str, args: &[&str], working_dir: &Path) -> String {
    let mut parts = vec![program];
    parts.extend(summarize_args(args));
    format!(
        "Executing: {} in {}",
        parts.join(" "),
        working_dir.display()
    )
}

/// [`CommandRunner`] backed by real operating-system processes.
///
/// No timeout is applied; a hung child blocks the caller until it exits.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    verbose: AtomicBool,
}

impl ProcessRunner {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose: AtomicBool::new(verbose),
        }
    }

    fn trace(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError> {
        debug!(program, dir = %working_dir.display(), argc = args.len(), "running command");
        if self.is_verbose() {
            writeln!(output, "{}", invocation_line(program, args, working_dir))
                .map_err(ExecError::Sink)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn execute(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError> {
        self.trace(output, working_dir, program, args)?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let wait_err = |source: io::Error| ExecError::Wait {
            program: program.to_string(),
            source,
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| wait_err(io::Error::other("stdout was not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| wait_err(io::Error::other("stderr was not piped")))?;

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let mut stdout_line = Vec::new();
        let mut stderr_line = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        // `read_until` keeps partial reads in the buffer when the other
        // branch wins, so each line is forwarded whole and byte for byte.
        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut stdout_line), if stdout_open => {
                    stdout_open = read.map_err(wait_err)? > 0;
                    forward(output, &mut stdout_line)?;
                }
                read = stderr.read_until(b'\n', &mut stderr_line), if stderr_open => {
                    stderr_open = read.map_err(wait_err)? > 0;
                    forward(output, &mut stderr_line)?;
                }
            }
        }

        let status = child.wait().await.map_err(wait_err)?;
        if !status.success() {
            return Err(ExecError::Status {
                program: program.to_string(),
                status,
            });
        }
        Ok(())
    }

    async fn execute_and_capture(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<String, ExecError> {
        self.trace(output, working_dir, program, args)?;

        let result = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !result.status.success() {
            return Err(ExecError::Exit {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&result.stdout).into_owned())
    }

    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }
}

/// Write and clear whatever `line` holds.
fn forward(output: &mut (dyn Write + Send), line: &mut Vec<u8>) -> Result<(), ExecError> {
    if line.is_empty() {
        return Ok(());
    }
    output.write_all(line).map_err(ExecError::Sink)?;
    line.clear();
    Ok(())
}

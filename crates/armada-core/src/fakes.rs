//! In-memory fakes for the injectable traits (testing only).
//!
//! Provides `MemoryReporter`, `ScriptedRunner`, `FixedPrompt` and
//! `FakePullRequests`, which record what they were asked to do instead of
//! touching the terminal, processes, or GitHub.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::campaign::PrDescription;
use crate::exec::{invocation_line, CommandRunner, ExecError};
use crate::github::{GitHubError, PullRequests};
use crate::report::{Activity, Reporter};

// ---------------------------------------------------------------------------
// MemoryReporter
// ---------------------------------------------------------------------------

/// Everything a [`MemoryReporter`] was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Started(String),
    Succeeded {
        title: String,
        output: String,
    },
    Warned {
        title: String,
        message: String,
        output: String,
    },
    Failed {
        title: String,
        message: String,
        output: String,
    },
    Success(String),
    Warning(String),
}

/// [`Reporter`] that records events instead of printing them.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ReportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for MemoryReporter {
    fn start_activity(&self, title: &str) -> Box<dyn Activity> {
        self.push(ReportEvent::Started(title.to_string()));
        Box::new(MemoryActivity {
            title: title.to_string(),
            output: Vec::new(),
            events: Arc::clone(&self.events),
        })
    }

    fn success(&self, message: &str) {
        self.push(ReportEvent::Success(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(ReportEvent::Warning(message.to_string()));
    }
}

struct MemoryActivity {
    title: String,
    output: Vec<u8>,
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl MemoryActivity {
    fn finish(self, event: impl FnOnce(String, String) -> ReportEvent) {
        let output = String::from_utf8_lossy(&self.output).into_owned();
        self.events.lock().unwrap().push(event(self.title, output));
    }
}

impl Write for MemoryActivity {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Activity for MemoryActivity {
    fn writer(&mut self) -> &mut (dyn Write + Send) {
        self
    }

    fn end_with_success(self: Box<Self>) {
        self.finish(|title, output| ReportEvent::Succeeded { title, output });
    }

    fn end_with_warning(self: Box<Self>, message: &str) {
        let message = message.to_string();
        self.finish(|title, output| ReportEvent::Warned {
            title,
            message,
            output,
        });
    }

    fn end_with_failure(self: Box<Self>, message: &str) {
        let message = message.to_string();
        self.finish(|title, output| ReportEvent::Failed {
            title,
            message,
            output,
        });
    }
}

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// Canned response for one [`ScriptedRunner`] invocation.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed, producing this stdout.
    Stdout(String),
    /// Fail with this message.
    Fail(String),
}

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub working_dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    /// `true` for `execute_and_capture`, `false` for `execute`.
    pub captured: bool,
}

/// [`CommandRunner`] replaying scripted responses in order.
///
/// Once the script runs out every invocation succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Invocation>>,
    verbose: AtomicBool,
}

impl ScriptedRunner {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
        captured: bool,
    ) -> Result<String, ExecError> {
        if self.is_verbose() {
            writeln!(output, "{}", invocation_line(program, args, working_dir))
                .map_err(ExecError::Sink)?;
        }
        self.calls.lock().unwrap().push(Invocation {
            working_dir: working_dir.to_path_buf(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            captured,
        });

        match self.responses.lock().unwrap().pop_front() {
            None => Ok(String::new()),
            Some(Scripted::Stdout(stdout)) => Ok(stdout),
            Some(Scripted::Fail(message)) => Err(ExecError::Spawn {
                program: program.to_string(),
                source: io::Error::other(message),
            }),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn execute(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError> {
        let stdout = self.respond(output, working_dir, program, args, false)?;
        output.write_all(stdout.as_bytes()).map_err(ExecError::Sink)
    }

    async fn execute_and_capture(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<String, ExecError> {
        self.respond(output, working_dir, program, args, true)
    }

    fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// FixedPrompt
// ---------------------------------------------------------------------------

/// [`crate::gate::Prompt`] that always gives the same answer.
#[derive(Debug, Default)]
pub struct FixedPrompt {
    answer: bool,
    questions: Mutex<Vec<String>>,
}

impl FixedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl crate::gate::Prompt for FixedPrompt {
    fn ask_confirm(&self, prompt: &str) -> bool {
        self.questions.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

// ---------------------------------------------------------------------------
// FakePullRequests
// ---------------------------------------------------------------------------

/// Scripted result of a [`FakePullRequests`] operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakePr {
    Ok,
    NoPr,
    Fail(String),
}

/// One recorded pull request operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrCall {
    pub working_dir: PathBuf,
    pub branch: String,
    /// Title requested by `update_pr_description`; `None` for a close.
    pub title: Option<String>,
}

/// [`PullRequests`] whose results are keyed by the working copy path.
///
/// A working copy matching no configured suffix succeeds.
#[derive(Debug, Default)]
pub struct FakePullRequests {
    results: Vec<(PathBuf, FakePr)>,
    calls: Mutex<Vec<PrCall>>,
}

impl FakePullRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `result` for working copies ending in `suffix` (e.g. `acme/repo`).
    pub fn with(mut self, suffix: &str, result: FakePr) -> Self {
        self.results.push((PathBuf::from(suffix), result));
        self
    }

    pub fn calls(&self) -> Vec<PrCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(
        &self,
        working_dir: &Path,
        branch: &str,
        title: Option<String>,
    ) -> Result<(), GitHubError> {
        self.calls.lock().unwrap().push(PrCall {
            working_dir: working_dir.to_path_buf(),
            branch: branch.to_string(),
            title,
        });

        let result = self
            .results
            .iter()
            .find(|(suffix, _)| working_dir.ends_with(suffix))
            .map(|(_, result)| result.clone())
            .unwrap_or(FakePr::Ok);

        match result {
            FakePr::Ok => Ok(()),
            FakePr::NoPr => Err(GitHubError::NoPrFound {
                path: working_dir.to_path_buf(),
                branch: branch.to_string(),
            }),
            FakePr::Fail(message) => Err(GitHubError::Command(ExecError::Spawn {
                program: "gh".to_string(),
                source: io::Error::other(message),
            })),
        }
    }
}

#[async_trait]
impl PullRequests for FakePullRequests {
    async fn close_pull_request(
        &self,
        _output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
    ) -> Result<(), GitHubError> {
        self.respond(working_dir, branch, None)
    }

    async fn update_pr_description(
        &self,
        _output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
        description: &PrDescription,
    ) -> Result<(), GitHubError> {
        self.respond(working_dir, branch, Some(description.title.clone()))
    }
}

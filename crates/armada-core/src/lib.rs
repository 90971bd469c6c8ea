//! armada core library
//!
//! Runs one pull request action across every repository of a campaign:
//!
//! - [`campaign`]: campaign directory, repos file and PR description
//! - [`exec`]: external command execution with redacted verbose traces
//! - [`github`]: pull request operations through the `gh` CLI
//! - [`engine`]: sequential batch loop with done / skipped / errored outcomes
//! - [`gate`] and [`mode`]: confirmation and action flag validation
//! - [`update_prs`]: the `update-prs` command wiring it all together

pub mod campaign;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod fakes;
pub mod gate;
pub mod github;
pub mod mode;
pub mod report;
pub mod telemetry;
pub mod update_prs;

pub use campaign::{Campaign, PrDescription, Repository};
pub use config::Settings;
pub use engine::{
    AmendDescriptions, BatchEngine, ClosePullRequests, Outcome, RepoAction, RunSummary,
};
pub use error::{ArmadaError, Result};
pub use exec::{summarize_args, CommandRunner, ExecError, ProcessRunner};
pub use gate::{confirm, Gate, Prompt, StdinPrompt};
pub use github::{GhCli, GitHubError, PrStatus, PullRequests};
pub use mode::{exactly_one, UpdateMode, UpdatePrsFlags};
pub use report::{Activity, ConsoleReporter, Reporter};
pub use telemetry::init_tracing;
pub use update_prs::{RunOutcome, UpdatePrs};

/// armada version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

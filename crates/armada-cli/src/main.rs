//! armada - campaign-wide pull request actions
//!
//! Run from (or point `--campaign-dir` at) a campaign directory holding a
//! `repos.txt` and the clones under `work/<org>/<repo>`.
//!
//! ## Commands
//!
//! - `update-prs --close`: close every PR opened by the campaign
//! - `update-prs --amend-description`: rewrite every PR title and body from
//!   the campaign `README.md`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use armada_core::telemetry::level_for;
use armada_core::{
    ConsoleReporter, GhCli, ProcessRunner, RunOutcome, Settings, StdinPrompt, UpdatePrs,
    UpdatePrsFlags,
};

#[derive(Parser)]
#[command(name = "armada")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run pull request actions across every repository of a campaign", long_about = None)]
struct Cli {
    /// Echo external commands before running them and log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Program used for pull request operations
    #[arg(long, global = true, env = "ARMADA_GH", default_value = "gh")]
    gh: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update all PRs that have been generated by the campaign
    UpdatePrs(UpdatePrsArgs),
}

#[derive(Args)]
struct UpdatePrsArgs {
    /// Close all generated PRs
    #[arg(long)]
    close: bool,

    /// Replace the title and body of all generated PRs with the campaign README.md
    #[arg(long)]
    amend_description: bool,

    /// Skips the confirmation prompt
    #[arg(long)]
    yes: bool,

    /// Repos file to use instead of repos.txt
    #[arg(long)]
    repos: Option<PathBuf>,

    /// Campaign directory
    #[arg(long, env = "ARMADA_CAMPAIGN_DIR", default_value = ".")]
    campaign_dir: PathBuf,
}

impl UpdatePrsArgs {
    fn flags(&self) -> UpdatePrsFlags {
        UpdatePrsFlags {
            close: self.close,
            amend_description: self.amend_description,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    armada_core::init_tracing(cli.json, level_for(cli.verbose));

    match cli.command {
        Commands::UpdatePrs(args) => cmd_update_prs(&cli.gh, cli.verbose, args).await,
    }
}

/// Act on every PR of the campaign; exits non-zero when any repository errored.
async fn cmd_update_prs(gh: &str, verbose: bool, args: UpdatePrsArgs) -> Result<ExitCode> {
    let flags = args.flags();
    let settings = Settings::new(args.campaign_dir)
        .with_gh_program(gh)
        .with_repos_file(args.repos)
        .with_verbose(verbose);
    debug!(?settings, "update-prs");

    let runner = Arc::new(ProcessRunner::new(settings.verbose));
    let prs = Arc::new(GhCli::new(settings.gh_program.clone(), runner));
    let command = UpdatePrs::new(prs, Arc::new(StdinPrompt), Arc::new(ConsoleReporter::new()));

    let outcome = command
        .run(flags, args.yes, &settings)
        .await
        .context("update-prs failed")?;

    Ok(exit_code(&outcome))
}

fn exit_code(outcome: &RunOutcome) -> ExitCode {
    if outcome.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

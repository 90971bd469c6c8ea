//! The `update-prs` command: act on every PR a campaign has opened.
//!
//! Flow: validate the action flags, read the campaign, confirm with the
//! operator, then hand the chosen action to the [`BatchEngine`]. A flag error
//! stops the run before anything is read or asked; a declined confirmation
//! stops it before any repository is touched, without a summary.

use std::sync::Arc;

use tracing::info;

use crate::campaign::{Campaign, PrDescription};
use crate::config::Settings;
use crate::engine::{AmendDescriptions, BatchEngine, ClosePullRequests, RepoAction, RunSummary};
use crate::error::Result;
use crate::gate::{confirm, Prompt};
use crate::github::PullRequests;
use crate::mode::{UpdateMode, UpdatePrsFlags};
use crate::report::Reporter;

/// Name used in the final summary line.
pub const OPERATION: &str = "armada update-prs";

/// How an `update-prs` run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The operator declined; nothing was processed.
    Aborted,
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunOutcome::Aborted => None,
            RunOutcome::Completed(summary) => Some(summary),
        }
    }

    /// `false` only when repositories errored.
    pub fn is_clean(&self) -> bool {
        self.summary().map_or(true, |s| !s.has_errors())
    }
}

/// `update-prs` with its collaborators injected.
pub struct UpdatePrs {
    prs: Arc<dyn PullRequests>,
    prompt: Arc<dyn Prompt>,
    reporter: Arc<dyn Reporter>,
}

impl UpdatePrs {
    pub fn new(
        prs: Arc<dyn PullRequests>,
        prompt: Arc<dyn Prompt>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            prs,
            prompt,
            reporter,
        }
    }

    pub async fn run(
        &self,
        flags: UpdatePrsFlags,
        skip_confirmation: bool,
        settings: &Settings,
    ) -> Result<RunOutcome> {
        let mode = flags.mode()?;
        let campaign = self.read_campaign(settings)?;

        let action: Box<dyn RepoAction> = match mode {
            UpdateMode::Close => Box::new(ClosePullRequests::new(Arc::clone(&self.prs))),
            UpdateMode::AmendDescription => {
                let description = self.read_description(&campaign)?;
                Box::new(AmendDescriptions::new(Arc::clone(&self.prs), description))
            }
        };

        let question = mode.confirmation(&campaign.name);
        if !confirm(self.prompt.as_ref(), &question, skip_confirmation).proceeds() {
            info!(campaign = %campaign.name, "declined at confirmation");
            return Ok(RunOutcome::Aborted);
        }

        let summary = BatchEngine::new(Arc::clone(&self.reporter))
            .run(&campaign, OPERATION, action.as_ref())
            .await;
        Ok(RunOutcome::Completed(summary))
    }

    fn read_campaign(&self, settings: &Settings) -> Result<Campaign> {
        let activity = self.reporter.start_activity("Reading campaign data");
        match Campaign::open(&settings.campaign_dir, settings.repos_file.as_deref()) {
            Ok(campaign) => {
                activity.end_with_success();
                Ok(campaign)
            }
            Err(err) => {
                activity.end_with_failure(&err.to_string());
                Err(err)
            }
        }
    }

    fn read_description(&self, campaign: &Campaign) -> Result<PrDescription> {
        let activity = self.reporter.start_activity("Reading PR description");
        match campaign.pr_description() {
            Ok(description) => {
                activity.end_with_success();
                Ok(description)
            }
            Err(err) => {
                activity.end_with_failure(&err.to_string());
                Err(err)
            }
        }
    }
}

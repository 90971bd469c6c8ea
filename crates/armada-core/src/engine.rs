//! Sequential batch execution over the repositories of a campaign.
//!
//! [`BatchEngine::run`] visits every repository exactly once, in campaign
//! order, and classifies each into an [`Outcome`]:
//!
//! - no local clone → `Skipped`, the action is not invoked
//! - action succeeded → `Done`
//! - action found no campaign PR → `Skipped`
//! - anything else → `Errored`, and the run carries on
//!
//! A single aggregate line is reported once the last repository is done.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info_span, Instrument};

use crate::campaign::{Campaign, PrDescription, Repository};
use crate::github::{GitHubError, PullRequests};
use crate::report::Reporter;

/// Result of processing one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Skipped(String),
    Errored(String),
}

impl Outcome {
    /// Classify the result of a repository action.
    pub fn from_result(result: Result<(), GitHubError>) -> Self {
        match result {
            Ok(()) => Outcome::Done,
            Err(err @ GitHubError::NoPrFound { .. }) => Outcome::Skipped(err.to_string()),
            Err(err @ (GitHubError::Command(_) | GitHubError::Parse(_))) => {
                Outcome::Errored(err.to_string())
            }
        }
    }
}

/// Aggregate counters for a batch run.
///
/// `done + skipped + errored` always equals the number of repositories
/// processed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Done => self.done += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.done + self.skipped + self.errored
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }

    /// Unstyled aggregate line for `operation`.
    pub fn describe(&self, operation: &str) -> String {
        if self.has_errors() {
            format!(
                "{operation} completed with errors ({} OK, {} skipped, {} errored)",
                self.done, self.skipped, self.errored
            )
        } else {
            format!(
                "{operation} completed ({} OK, {} skipped)",
                self.done, self.skipped
            )
        }
    }
}

/// An action applied to each repository with a local clone.
#[async_trait]
pub trait RepoAction: Send + Sync {
    /// Activity title for `repo`.
    fn describe(&self, repo: &Repository) -> String;

    async fn apply(
        &self,
        campaign: &Campaign,
        repo: &Repository,
        output: &mut (dyn Write + Send),
    ) -> Result<(), GitHubError>;
}

/// Closes the campaign PR of each repository.
pub struct ClosePullRequests {
    prs: Arc<dyn PullRequests>,
}

impl ClosePullRequests {
    pub fn new(prs: Arc<dyn PullRequests>) -> Self {
        Self { prs }
    }
}

#[async_trait]
impl RepoAction for ClosePullRequests {
    fn describe(&self, repo: &Repository) -> String {
        format!("Closing PR in {}", repo.full_name)
    }

    async fn apply(
        &self,
        campaign: &Campaign,
        repo: &Repository,
        output: &mut (dyn Write + Send),
    ) -> Result<(), GitHubError> {
        self.prs
            .close_pull_request(output, &campaign.repo_path(repo), &campaign.name)
            .await
    }
}

/// Rewrites the title and body of each campaign PR.
pub struct AmendDescriptions {
    prs: Arc<dyn PullRequests>,
    description: PrDescription,
}

impl AmendDescriptions {
    pub fn new(prs: Arc<dyn PullRequests>, description: PrDescription) -> Self {
        Self { prs, description }
    }
}

#[async_trait]
impl RepoAction for AmendDescriptions {
    fn describe(&self, repo: &Repository) -> String {
        format!("Updating PR description in {}", repo.full_name)
    }

    async fn apply(
        &self,
        campaign: &Campaign,
        repo: &Repository,
        output: &mut (dyn Write + Send),
    ) -> Result<(), GitHubError> {
        self.prs
            .update_pr_description(
                output,
                &campaign.repo_path(repo),
                &campaign.name,
                &self.description,
            )
            .await
    }
}

/// Runs a [`RepoAction`] over a campaign, one repository at a time.
pub struct BatchEngine {
    reporter: Arc<dyn Reporter>,
}

impl BatchEngine {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Apply `action` to every repository of `campaign` and report the
    /// aggregate under the name `operation`.
    pub async fn run(
        &self,
        campaign: &Campaign,
        operation: &str,
        action: &dyn RepoAction,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for repo in &campaign.repos {
            let span = info_span!("repo", name = %repo.full_name);
            let outcome = self
                .process(campaign, repo, action)
                .instrument(span)
                .await;
            summary.record(&outcome);
        }

        debug!(
            campaign = %campaign.name,
            done = summary.done,
            skipped = summary.skipped,
            errored = summary.errored,
            "batch finished"
        );
        self.reporter.summary(operation, &summary);
        summary
    }

    async fn process(
        &self,
        campaign: &Campaign,
        repo: &Repository,
        action: &dyn RepoAction,
    ) -> Outcome {
        let mut activity = self.reporter.start_activity(&action.describe(repo));

        let path = campaign.repo_path(repo);
        let outcome = if !path.exists() {
            Outcome::Skipped(format!(
                "Directory {} does not exist - has it been cloned?",
                path.display()
            ))
        } else {
            Outcome::from_result(action.apply(campaign, repo, activity.writer()).await)
        };

        match &outcome {
            Outcome::Done => {
                debug!("done");
                activity.end_with_success();
            }
            Outcome::Skipped(reason) => {
                debug!(%reason, "skipped");
                activity.end_with_warning(reason);
            }
            Outcome::Errored(cause) => {
                debug!(%cause, "errored");
                activity.end_with_failure(cause);
            }
        }
        outcome
    }
}

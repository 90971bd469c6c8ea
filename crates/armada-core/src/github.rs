//! Pull request operations through the `gh` CLI.
//!
//! Campaign pull requests are found by their head branch, which is named
//! after the campaign. A working copy with no such PR yields
//! [`GitHubError::NoPrFound`], which callers treat as "nothing to do".

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::campaign::PrDescription;
use crate::exec::{CommandRunner, ExecError};

/// Fields requested from `gh pr status --json`.
const PR_STATUS_FIELDS: &str = "number,state,title,url,headRefName";

/// Errors produced by pull request operations.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// The working copy has no pull request for the campaign branch.
    #[error("no PR found for {} and branch {branch}", path.display())]
    NoPrFound { path: PathBuf, branch: String },

    #[error(transparent)]
    Command(#[from] ExecError),

    #[error("failed to parse `gh pr status` output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A pull request as reported by `gh pr status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrStatus {
    pub number: u64,
    pub state: String,
    pub title: String,
    pub url: String,
    pub head_ref_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PrStatusResponse {
    current_branch: Option<PrStatus>,
    created_by: Vec<PrStatus>,
}

/// Pick the PR whose head branch is `branch` out of `gh pr status` JSON.
pub fn match_pr(status_json: &str, branch: &str) -> Result<Option<PrStatus>, serde_json::Error> {
    let response: PrStatusResponse = serde_json::from_str(status_json)?;
    Ok(response
        .created_by
        .into_iter()
        .chain(response.current_branch)
        .find(|pr| pr.head_ref_name == branch))
}

/// Pull request operations applied to one working copy.
#[async_trait]
pub trait PullRequests: Send + Sync {
    /// Close the PR whose head branch is `branch`.
    async fn close_pull_request(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
    ) -> Result<(), GitHubError>;

    /// Replace the title and body of the PR whose head branch is `branch`.
    async fn update_pr_description(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
        description: &PrDescription,
    ) -> Result<(), GitHubError>;
}

/// [`PullRequests`] implemented by shelling out to `gh`.
pub struct GhCli {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl GhCli {
    pub fn new(program: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Find the PR for `branch` in the repository checked out at `working_dir`.
    pub async fn find_pr(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
    ) -> Result<PrStatus, GitHubError> {
        let status_json = self
            .runner
            .execute_and_capture(
                output,
                working_dir,
                &self.program,
                &["pr", "status", "--json", PR_STATUS_FIELDS],
            )
            .await?;

        match match_pr(&status_json, branch)? {
            Some(pr) => {
                debug!(number = pr.number, url = %pr.url, "found campaign PR");
                Ok(pr)
            }
            None => Err(GitHubError::NoPrFound {
                path: working_dir.to_path_buf(),
                branch: branch.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PullRequests for GhCli {
    async fn close_pull_request(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let pr = self.find_pr(output, working_dir, branch).await?;
        let number = pr.number.to_string();
        self.runner
            .execute(output, working_dir, &self.program, &["pr", "close", &number])
            .await?;
        Ok(())
    }

    async fn update_pr_description(
        &self,
        output: &mut (dyn Write + Send),
        working_dir: &Path,
        branch: &str,
        description: &PrDescription,
    ) -> Result<(), GitHubError> {
        let pr = self.find_pr(output, working_dir, branch).await?;
        let number = pr.number.to_string();
        self.runner
            .execute(
                output,
                working_dir,
                &self.program,
                &[
                    "pr",
                    "edit",
                    &number,
                    "--title",
                    &description.title,
                    "--body",
                    &description.body,
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{Scripted, ScriptedRunner};

    const STATUS_WITH_CAMPAIGN_PR: &str = r#"{
        "createdBy": [
            {"number": 12, "state": "OPEN", "title": "Other", "url": "https://x/12", "headRefName": "other"},
            {"number": 42, "state": "OPEN", "title": "Rename foo", "url": "https://x/42", "headRefName": "rename-foo"}
        ],
        "currentBranch": {},
        "needsReview": []
    }"#;

    #[test]
    fn test_match_pr_by_head_branch() {
        let pr = match_pr(STATUS_WITH_CAMPAIGN_PR, "rename-foo")
            .unwrap()
            .unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.title, "Rename foo");
    }

    #[test]
    fn test_match_pr_uses_current_branch() {
        let json = r#"{"createdBy": [], "currentBranch": {"number": 7, "headRefName": "rename-foo"}}"#;
        let pr = match_pr(json, "rename-foo").unwrap().unwrap();
        assert_eq!(pr.number, 7);
    }

    #[test]
    fn test_match_pr_none_for_other_branches() {
        assert!(match_pr(STATUS_WITH_CAMPAIGN_PR, "missing").unwrap().is_none());
        assert!(match_pr(r#"{"currentBranch": null}"#, "x").unwrap().is_none());
    }

    #[test]
    fn test_match_pr_rejects_garbage() {
        assert!(match_pr("not json", "x").is_err());
    }

    #[tokio::test]
    async fn test_close_runs_pr_close_with_number() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            Scripted::Stdout(STATUS_WITH_CAMPAIGN_PR.to_string()),
            Scripted::Stdout(String::new()),
        ]));
        let gh = GhCli::new("gh", runner.clone());
        let mut sink: Vec<u8> = Vec::new();

        gh.close_pull_request(&mut sink, Path::new("/w/acme/a"), "rename-foo")
            .await
            .expect("close");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].captured);
        assert_eq!(calls[0].args[..2], ["pr", "status"]);
        assert!(!calls[1].captured);
        assert_eq!(calls[1].args, vec!["pr", "close", "42"]);
        assert_eq!(calls[1].working_dir, PathBuf::from("/w/acme/a"));
    }

    #[tokio::test]
    async fn test_close_without_pr_is_no_pr_found() {
        let runner = Arc::new(ScriptedRunner::new(vec![Scripted::Stdout(
            r#"{"createdBy": []}"#.to_string(),
        )]));
        let gh = GhCli::new("gh", runner.clone());
        let mut sink: Vec<u8> = Vec::new();

        let err = gh
            .close_pull_request(&mut sink, Path::new("/w/acme/a"), "rename-foo")
            .await
            .unwrap_err();

        assert!(matches!(err, GitHubError::NoPrFound { .. }));
        assert_eq!(err.to_string(), "no PR found for /w/acme/a and branch rename-foo");
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_status_failure_is_command_error() {
        let runner = Arc::new(ScriptedRunner::new(vec![Scripted::Fail(
            "gh: not logged in".to_string(),
        )]));
        let gh = GhCli::new("gh", runner);
        let mut sink: Vec<u8> = Vec::new();

        let err = gh
            .close_pull_request(&mut sink, Path::new("/w/acme/a"), "rename-foo")
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::Command(_)));
        assert!(err.to_string().contains("not logged in"));
    }

    #[tokio::test]
    async fn test_update_description_passes_full_body() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            Scripted::Stdout(STATUS_WITH_CAMPAIGN_PR.to_string()),
            Scripted::Stdout(String::new()),
        ]));
        let gh = GhCli::new("gh", runner.clone());
        let description = PrDescription {
            title: "Rename foo to bar".to_string(),
            body: "A long body that is well beyond thirty characters.".to_string(),
        };
        let mut sink: Vec<u8> = Vec::new();

        gh.update_pr_description(&mut sink, Path::new("/w/acme/a"), "rename-foo", &description)
            .await
            .expect("update");

        let calls = runner.calls();
        assert_eq!(
            calls[1].args,
            vec![
                "pr",
                "edit",
                "42",
                "--title",
                "Rename foo to bar",
                "--body",
                "A long body that is well beyond thirty characters.",
            ]
        );
    }
}

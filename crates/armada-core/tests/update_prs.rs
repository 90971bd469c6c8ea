//! Integration tests for the `update-prs` flow with in-memory collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use armada_core::fakes::{
    FakePr, FakePullRequests, FixedPrompt, MemoryReporter, ReportEvent, Scripted, ScriptedRunner,
};
use armada_core::{
    ArmadaError, CommandRunner, GhCli, RunOutcome, RunSummary, Settings, UpdatePrs,
    UpdatePrsFlags,
};
use tempfile::TempDir;

const CLOSE: UpdatePrsFlags = UpdatePrsFlags {
    close: true,
    amend_description: false,
};

const AMEND: UpdatePrsFlags = UpdatePrsFlags {
    close: false,
    amend_description: true,
};

/// Create `<tmp>/<name>` with a repos file and clones for `cloned`.
fn campaign_dir(name: &str, repos: &[&str], cloned: &[&str]) -> (TempDir, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join(name);
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("repos.txt"), repos.join("\n")).unwrap();
    for repo in cloned {
        std::fs::create_dir_all(dir.join("work").join(repo)).unwrap();
    }
    (tmp, dir)
}

struct Harness {
    prs: Arc<FakePullRequests>,
    prompt: Arc<FixedPrompt>,
    reporter: MemoryReporter,
}

impl Harness {
    fn new(prs: FakePullRequests, answer: bool) -> Self {
        Self {
            prs: Arc::new(prs),
            prompt: Arc::new(FixedPrompt::new(answer)),
            reporter: MemoryReporter::new(),
        }
    }

    fn command(&self) -> UpdatePrs {
        UpdatePrs::new(
            self.prs.clone(),
            self.prompt.clone(),
            Arc::new(self.reporter.clone()),
        )
    }

    fn called_repos(&self) -> Vec<String> {
        self.prs
            .calls()
            .iter()
            .map(|c| suffix(&c.working_dir))
            .collect()
    }
}

fn suffix(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .rev()
        .take(2)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{}/{}", parts[1], parts[0])
}

fn summary_of(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::Aborted => panic!("run was aborted"),
    }
}

#[tokio::test]
async fn rename_foo_end_to_end() {
    let (_tmp, dir) = campaign_dir(
        "rename-foo",
        &["acme/a", "acme/b", "acme/c"],
        &["acme/b", "acme/c"],
    );
    let harness = Harness::new(
        FakePullRequests::new().with("acme/c", FakePr::Fail("gh exploded".to_string())),
        true,
    );

    let outcome = harness
        .command()
        .run(CLOSE, false, &Settings::new(&dir))
        .await
        .expect("run");

    let summary = summary_of(outcome);
    assert_eq!(
        summary,
        RunSummary {
            done: 1,
            skipped: 1,
            errored: 1
        }
    );

    // acme/a has no clone, so only b and c reach the PR tool.
    assert_eq!(harness.called_repos(), vec!["acme/b", "acme/c"]);
    assert!(harness.prs.calls().iter().all(|c| c.branch == "rename-foo"));

    let events = harness.reporter.events();
    assert!(events.iter().any(|e| matches!(
        e,
        ReportEvent::Warned { title, message, .. }
            if title == "Closing PR in acme/a" && message.contains("has it been cloned?")
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ReportEvent::Succeeded { title, .. } if title == "Closing PR in acme/b"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ReportEvent::Failed { title, message, .. }
            if title == "Closing PR in acme/c" && message.contains("gh exploded")
    )));

    match events.last() {
        Some(ReportEvent::Warning(line)) => {
            assert!(line.contains("1 errored"), "{line}");
            assert!(line.contains("1 OK"));
            assert!(line.contains("1 skipped"));
        }
        other => panic!("expected warning summary, got {other:?}"),
    }
}

#[tokio::test]
async fn all_repos_done_gives_success_summary() {
    let repos = ["acme/a", "acme/b", "acme/c"];
    let (_tmp, dir) = campaign_dir("rename-foo", &repos, &repos);
    let harness = Harness::new(FakePullRequests::new(), true);

    let summary = summary_of(
        harness
            .command()
            .run(CLOSE, true, &Settings::new(&dir))
            .await
            .expect("run"),
    );

    assert_eq!(summary.done, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.errored, 0);
    assert_eq!(
        harness.reporter.events().last(),
        Some(&ReportEvent::Success(
            "armada update-prs completed (3 OK, 0 skipped)".to_string()
        ))
    );
}

#[tokio::test]
async fn missing_pr_is_skipped_not_errored() {
    let repos = ["acme/a", "acme/b"];
    let (_tmp, dir) = campaign_dir("rename-foo", &repos, &repos);
    let harness = Harness::new(FakePullRequests::new().with("acme/a", FakePr::NoPr), true);

    let summary = summary_of(
        harness
            .command()
            .run(CLOSE, true, &Settings::new(&dir))
            .await
            .expect("run"),
    );

    assert_eq!(summary.done, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errored, 0);
    assert!(matches!(
        harness.reporter.events().last(),
        Some(ReportEvent::Success(_))
    ));
}

#[tokio::test]
async fn errors_do_not_stop_the_run() {
    let repos = ["acme/a", "acme/b", "acme/c"];
    let (_tmp, dir) = campaign_dir("rename-foo", &repos, &repos);
    let harness = Harness::new(
        FakePullRequests::new()
            .with("acme/a", FakePr::Fail("first".to_string()))
            .with("acme/b", FakePr::Fail("second".to_string())),
        true,
    );

    let summary = summary_of(
        harness
            .command()
            .run(CLOSE, true, &Settings::new(&dir))
            .await
            .expect("run"),
    );

    assert_eq!(summary.errored, 2);
    assert_eq!(summary.done, 1);
    assert_eq!(summary.total(), 3);
    assert_eq!(harness.called_repos(), vec!["acme/a", "acme/b", "acme/c"]);
}

#[tokio::test]
async fn skip_confirmation_never_asks() {
    let (_tmp, dir) = campaign_dir("rename-foo", &["acme/a"], &["acme/a"]);
    // Would decline if asked.
    let harness = Harness::new(FakePullRequests::new(), false);

    let outcome = harness
        .command()
        .run(CLOSE, true, &Settings::new(&dir))
        .await
        .expect("run");

    assert!(harness.prompt.questions().is_empty());
    assert_eq!(summary_of(outcome).done, 1);
}

#[tokio::test]
async fn declined_confirmation_aborts_silently() {
    let (_tmp, dir) = campaign_dir("rename-foo", &["acme/a", "acme/b"], &["acme/a", "acme/b"]);
    let harness = Harness::new(FakePullRequests::new(), false);

    let outcome = harness
        .command()
        .run(CLOSE, false, &Settings::new(&dir))
        .await
        .expect("run");

    assert_eq!(outcome, RunOutcome::Aborted);
    assert!(outcome.is_clean());
    assert_eq!(
        harness.prompt.questions(),
        vec!["Close all PRs from the rename-foo campaign?".to_string()]
    );
    assert!(harness.prs.calls().is_empty());
    // Only the campaign read was reported: no repo activity, no summary.
    assert_eq!(harness.reporter.events().len(), 2);
}

#[tokio::test]
async fn invalid_flags_fail_before_any_side_effect() {
    let (_tmp, dir) = campaign_dir("rename-foo", &["acme/a"], &["acme/a"]);

    for flags in [
        UpdatePrsFlags::default(),
        UpdatePrsFlags {
            close: true,
            amend_description: true,
        },
    ] {
        let harness = Harness::new(FakePullRequests::new(), true);
        let err = harness
            .command()
            .run(flags, false, &Settings::new(&dir))
            .await
            .unwrap_err();

        assert!(matches!(err, ArmadaError::InvalidFlags { .. }));
        assert!(harness.prompt.questions().is_empty());
        assert!(harness.reporter.events().is_empty());
        assert!(harness.prs.calls().is_empty());
    }
}

#[tokio::test]
async fn unreadable_campaign_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let harness = Harness::new(FakePullRequests::new(), true);

    let err = harness
        .command()
        .run(CLOSE, true, &Settings::new(tmp.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, ArmadaError::Read { .. }));
    let events = harness.reporter.events();
    assert_eq!(events[0], ReportEvent::Started("Reading campaign data".to_string()));
    assert!(matches!(events[1], ReportEvent::Failed { .. }));
}

#[tokio::test]
async fn amend_description_sends_readme_and_redacts_trace() {
    let (_tmp, dir) = campaign_dir("rename-foo", &["acme/a"], &["acme/a"]);
    let body = "Renames every use of foo to bar across the codebase.";
    std::fs::write(
        dir.join("README.md"),
        format!("# Rename foo to bar\n\n{body}\n"),
    )
    .unwrap();

    let status = r#"{"createdBy": [{"number": 42, "headRefName": "rename-foo"}]}"#;
    let runner = Arc::new(ScriptedRunner::new(vec![Scripted::Stdout(status.to_string())]));
    runner.set_verbose(true);
    let gh = Arc::new(GhCli::new("gh", runner.clone()));
    let prompt = Arc::new(FixedPrompt::new(true));
    let reporter = MemoryReporter::new();

    let outcome = UpdatePrs::new(gh, prompt.clone(), Arc::new(reporter.clone()))
        .run(AMEND, false, &Settings::new(&dir))
        .await
        .expect("run");

    assert_eq!(summary_of(outcome).done, 1);
    assert_eq!(
        prompt.questions(),
        vec!["Update the title and description of all PRs from the rename-foo campaign?"
            .to_string()]
    );

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].args,
        vec!["pr", "edit", "42", "--title", "Rename foo to bar", "--body", body]
    );

    let output = reporter
        .events()
        .into_iter()
        .find_map(|e| match e {
            ReportEvent::Succeeded { title, output } if title.contains("acme/a") => Some(output),
            _ => None,
        })
        .expect("repo activity");
    // The field list is longer than thirty bytes, so it is summarized too.
    assert!(output.contains("Executing: gh pr status --json ... in "));
    assert!(output.contains("Executing: gh pr edit 42 --title Rename foo to bar --body ... in "));
    assert!(!output.contains(body));
}

#[tokio::test]
async fn amend_without_readme_fails_before_prompt() {
    let (_tmp, dir) = campaign_dir("rename-foo", &["acme/a"], &["acme/a"]);
    let harness = Harness::new(FakePullRequests::new(), true);

    let err = harness
        .command()
        .run(AMEND, false, &Settings::new(&dir))
        .await
        .unwrap_err();

    assert!(matches!(err, ArmadaError::Read { .. }));
    assert!(harness.prompt.questions().is_empty());
    assert!(harness.prs.calls().is_empty());
}

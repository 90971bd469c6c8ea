//! Campaign directory model.
//!
//! A campaign is a directory named after the campaign, holding:
//! - `repos.txt`: one `org/repo` (or `host/org/repo`) per line, `#` comments
//! - `README.md`: the pull request title (first line) and body (the rest)
//! - `work/<org>/<repo>`: the local clone of each repository

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ArmadaError, Result};

/// Default name of the repository list inside a campaign directory.
pub const DEFAULT_REPOS_FILE: &str = "repos.txt";

/// Default name of the pull request description file.
pub const DEFAULT_DESCRIPTION_FILE: &str = "README.md";

/// Directory under the campaign root that holds the clones.
pub const WORK_DIR: &str = "work";

/// One target repository of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub host: Option<String>,
    pub org: String,
    pub name: String,
    /// `org/name`
    pub full_name: String,
}

impl Repository {
    /// Parse `org/repo` or `host/org/repo`. Returns `None` for anything else.
    ///
    /// Segments become path components under `work/`, so `.`, `..` and
    /// backslashes are refused.
    pub fn parse(entry: &str) -> Option<Self> {
        let parts: Vec<&str> = entry.split('/').collect();
        if !parts.iter().all(|p| is_valid_segment(p)) {
            return None;
        }
        let (host, org, name) = match parts.as_slice() {
            [org, name] => (None, *org, *name),
            [host, org, name] => (Some(host.to_string()), *org, *name),
            _ => return None,
        };
        Some(Self {
            host,
            org: org.to_string(),
            name: name.to_string(),
            full_name: format!("{org}/{name}"),
        })
    }

    /// Where the clone of this repository is expected under `campaign_root`.
    pub fn local_path(&self, campaign_root: &Path) -> PathBuf {
        campaign_root.join(WORK_DIR).join(&self.org).join(&self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(|c: char| c.is_whitespace() || c == '\\')
}

/// A named set of repositories acted on together.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub name: String,
    pub root: PathBuf,
    /// Processing order.
    pub repos: Vec<Repository>,
}

impl Campaign {
    /// Open the campaign rooted at `dir`.
    ///
    /// The campaign name is the directory name. `repos_file` is resolved
    /// against `dir` and defaults to [`DEFAULT_REPOS_FILE`].
    pub fn open(dir: &Path, repos_file: Option<&Path>) -> Result<Self> {
        let root = dir.canonicalize().map_err(|source| ArmadaError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArmadaError::InvalidCampaignDir(root.clone()))?;

        let repos_path = root.join(repos_file.unwrap_or(Path::new(DEFAULT_REPOS_FILE)));
        let contents = std::fs::read_to_string(&repos_path).map_err(|source| ArmadaError::Read {
            path: repos_path.clone(),
            source,
        })?;
        let repos = parse_repos(&contents, &repos_path)?;

        debug!(campaign = %name, repos = repos.len(), "opened campaign");
        Ok(Self { name, root, repos })
    }

    /// Local clone path of `repo` within this campaign.
    pub fn repo_path(&self, repo: &Repository) -> PathBuf {
        repo.local_path(&self.root)
    }

    /// Read the pull request description from the campaign's `README.md`.
    pub fn pr_description(&self) -> Result<PrDescription> {
        PrDescription::from_file(&self.root.join(DEFAULT_DESCRIPTION_FILE))
    }
}

/// Parse the contents of a repos file. `source` is only used in errors.
///
/// Duplicate entries keep their first position.
pub fn parse_repos(contents: &str, source: &Path) -> Result<Vec<Repository>> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let entry = raw.split('#').next().unwrap_or_default().trim();
        if entry.is_empty() {
            continue;
        }
        let repo = Repository::parse(entry).ok_or_else(|| ArmadaError::InvalidRepo {
            file: source.to_path_buf(),
            line: idx + 1,
            entry: entry.to_string(),
        })?;
        if !seen.insert(repo.full_name.clone()) {
            warn!(repo = %repo.full_name, line = idx + 1, "duplicate repository ignored");
            continue;
        }
        repos.push(repo);
    }

    Ok(repos)
}

/// Title and body applied to every pull request of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrDescription {
    pub title: String,
    pub body: String,
}

impl PrDescription {
    /// First line (leading `#` markers stripped) is the title, the rest the body.
    pub fn parse(contents: &str, source: &Path) -> Result<Self> {
        let mut lines = contents.splitn(2, '\n');
        let title = lines
            .next()
            .unwrap_or_default()
            .trim_start_matches('#')
            .trim()
            .to_string();
        if title.is_empty() {
            return Err(ArmadaError::InvalidDescription {
                path: source.to_path_buf(),
                reason: "first line must hold the PR title".to_string(),
            });
        }
        let body = lines.next().unwrap_or_default().trim().to_string();
        Ok(Self { title, body })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArmadaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }
}

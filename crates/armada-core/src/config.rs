//! Run settings shared by every armada command.

use std::path::PathBuf;

/// Default `gh` executable.
pub const DEFAULT_GH_PROGRAM: &str = "gh";

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Program invoked for pull request operations.
    pub gh_program: String,
    /// Campaign root directory.
    pub campaign_dir: PathBuf,
    /// Alternate repos file, relative to `campaign_dir` unless absolute.
    pub repos_file: Option<PathBuf>,
    /// Echo each external command before running it.
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            gh_program: DEFAULT_GH_PROGRAM.to_string(),
            campaign_dir: PathBuf::from("."),
            repos_file: None,
            verbose: false,
        }
    }
}

impl Settings {
    pub fn new(campaign_dir: impl Into<PathBuf>) -> Self {
        Settings {
            campaign_dir: campaign_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_gh_program(mut self, program: &str) -> Self {
        self.gh_program = program.to_string();
        self
    }

    pub fn with_repos_file(mut self, repos_file: Option<PathBuf>) -> Self {
        self.repos_file = repos_file;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

//! Error taxonomy for armada.

use std::path::PathBuf;

/// Errors produced while preparing or running a campaign-wide action.
#[derive(Debug, thiserror::Error)]
pub enum ArmadaError {
    /// Zero or several mutually exclusive action flags were given.
    #[error("{command} needs one and only one action flag ({selected} selected)")]
    InvalidFlags { command: String, selected: usize },

    /// The campaign directory has no final path component to name it by.
    #[error("cannot derive a campaign name from {}", .0.display())]
    InvalidCampaignDir(PathBuf),

    /// A line of the repos file is not `org/repo` or `host/org/repo`.
    #[error("invalid repository `{entry}` at {}:{line}", file.display())]
    InvalidRepo {
        file: PathBuf,
        line: usize,
        entry: String,
    },

    /// The PR description file could not be turned into a title and body.
    #[error("invalid PR description in {}: {reason}", path.display())]
    InvalidDescription { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for armada operations.
pub type Result<T> = std::result::Result<T, ArmadaError>;

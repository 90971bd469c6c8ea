//! Selection of exactly one action mode from mutually exclusive flags.

use crate::error::{ArmadaError, Result};

/// `true` when exactly one of `flags` is set.
pub fn exactly_one(flags: &[bool]) -> bool {
    flags.iter().filter(|on| **on).count() == 1
}

/// Pick the single enabled mode out of `candidates`.
///
/// Zero or several enabled candidates is [`ArmadaError::InvalidFlags`].
pub fn select_one<M: Copy>(command: &str, candidates: &[(bool, M)]) -> Result<M> {
    let flags: Vec<bool> = candidates.iter().map(|(on, _)| *on).collect();
    if !exactly_one(&flags) {
        return Err(ArmadaError::InvalidFlags {
            command: command.to_string(),
            selected: flags.iter().filter(|on| **on).count(),
        });
    }
    candidates
        .iter()
        .find_map(|(on, mode)| on.then_some(*mode))
        .ok_or_else(|| ArmadaError::InvalidFlags {
            command: command.to_string(),
            selected: 0,
        })
}

/// What `update-prs` does to each campaign PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Close,
    AmendDescription,
}

impl UpdateMode {
    /// Confirmation question for a campaign called `campaign`.
    pub fn confirmation(&self, campaign: &str) -> String {
        match self {
            UpdateMode::Close => format!("Close all PRs from the {campaign} campaign?"),
            UpdateMode::AmendDescription => format!(
                "Update the title and description of all PRs from the {campaign} campaign?"
            ),
        }
    }
}

/// Action flags accepted by `update-prs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdatePrsFlags {
    pub close: bool,
    pub amend_description: bool,
}

impl UpdatePrsFlags {
    pub fn mode(&self) -> Result<UpdateMode> {
        select_one(
            "update-prs",
            &[
                (self.close, UpdateMode::Close),
                (self.amend_description, UpdateMode::AmendDescription),
            ],
        )
    }
}

//! Confirmation before bulk changes.

use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::Confirm;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Yes/no question asked to the operator.
pub trait Prompt: Send + Sync {
    fn ask_confirm(&self, prompt: &str) -> bool;
}

/// [`Prompt`] asking the operator on the terminal.
///
/// An interactive stdin gets a `dialoguer` confirmation defaulting to no.
/// Piped stdin is read one line at a time with [`ask_confirm_with`], so
/// `echo y | armada update-prs --close` works.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask_confirm(&self, prompt: &str) -> bool {
        run_blocking(|| {
            if io::stdin().is_terminal() {
                Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
            } else {
                ask_confirm_with(prompt, &mut io::stdin().lock(), &mut io::stderr())
            }
        })
    }
}

/// Run a blocking read without stalling the runtime's worker thread.
///
/// `block_in_place` needs the multi-threaded runtime; anywhere else `f`
/// runs inline.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Ask `prompt` on `output` and read one answer line from `input`.
///
/// Anything other than `y`/`yes` (including read errors) is a decline.
pub fn ask_confirm_with(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if write!(output, "{prompt} [y/N]: ")
        .and_then(|_| output.flush())
        .is_err()
    {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"),
        Err(_) => false,
    }
}

/// Decision taken at the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Confirmation was skipped on request; the prompt was not shown.
    Bypassed,
    Confirmed,
    Declined,
}

impl Gate {
    pub fn proceeds(self) -> bool {
        !matches!(self, Gate::Declined)
    }
}

/// Ask `prompt` for confirmation of `question` unless `skip` is set.
pub fn confirm(prompt: &dyn Prompt, question: &str, skip: bool) -> Gate {
    if skip {
        return Gate::Bypassed;
    }
    if prompt.ask_confirm(question) {
        Gate::Confirmed
    } else {
        Gate::Declined
    }
}

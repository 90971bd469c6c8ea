//! Tracing setup for the `armada` binary.
//!
//! Progress lines from [`crate::report::ConsoleReporter`] own stdout, so log
//! records always go to stderr. `--verbose` turns on debug records for the
//! per-repository spans and command invocations of armada itself; third-party
//! crates stay at WARN unless `RUST_LOG` asks otherwise. `--json` switches the
//! records to newline-delimited JSON for CI log collectors.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose records follow the requested level.
const OWN_TARGETS: &[&str] = &["armada_core", "armada"];

/// Install the global subscriber. `RUST_LOG` replaces the default filter.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}

/// Filter used when `RUST_LOG` is unset: WARN globally, `level` for armada.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = String::from("warn");
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Level for armada's own records given the `--verbose` flag.
pub fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

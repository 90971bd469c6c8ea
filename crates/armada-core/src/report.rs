//! User-facing progress reporting.
//!
//! A [`Reporter`] hands out one [`Activity`] per unit of work. Command output
//! produced while the activity runs is written through [`Activity::writer`];
//! the activity then ends with success, a warning, or a failure.

use std::io::{self, Write};

use colored::Colorize;

use crate::engine::RunSummary;

/// One reported unit of work.
pub trait Activity: Write + Send {
    /// Sink for output produced while the activity is running.
    fn writer(&mut self) -> &mut (dyn Write + Send);

    fn end_with_success(self: Box<Self>);

    fn end_with_warning(self: Box<Self>, message: &str);

    fn end_with_failure(self: Box<Self>, message: &str);
}

/// Console-style reporting sink.
pub trait Reporter: Send + Sync {
    fn start_activity(&self, title: &str) -> Box<dyn Activity>;

    fn success(&self, message: &str);

    fn warning(&self, message: &str);

    /// Report the aggregate result of a batch run.
    fn summary(&self, operation: &str, summary: &RunSummary) {
        if summary.has_errors() {
            self.warning(&summary.describe(operation));
        } else {
            self.success(&summary.describe(operation));
        }
    }
}

/// [`Reporter`] printing styled lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn start_activity(&self, title: &str) -> Box<dyn Activity> {
        println!("{} {}", "→".cyan(), title);
        Box::new(ConsoleActivity {
            title: title.to_string(),
            out: IndentWriter::new(io::stdout()),
        })
    }

    fn success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    fn summary(&self, operation: &str, summary: &RunSummary) {
        let line = styled_summary(operation, summary);
        if summary.has_errors() {
            self.warning(&line);
        } else {
            self.success(&line);
        }
    }
}

/// [`RunSummary::describe`] with each count colored by outcome.
///
/// Identical to the unstyled line when coloring is disabled.
pub fn styled_summary(operation: &str, summary: &RunSummary) -> String {
    let ok = format!("{} OK", summary.done).green();
    let skipped = format!("{} skipped", summary.skipped).yellow();
    if summary.has_errors() {
        let errored = format!("{} errored", summary.errored).red();
        format!(
            "{operation} completed with {} ({ok}, {skipped}, {errored})",
            "errors".red()
        )
    } else {
        format!("{operation} completed ({ok}, {skipped})")
    }
}

struct ConsoleActivity {
    title: String,
    out: IndentWriter<io::Stdout>,
}

impl Write for ConsoleActivity {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Activity for ConsoleActivity {
    fn writer(&mut self) -> &mut (dyn Write + Send) {
        self
    }

    fn end_with_success(mut self: Box<Self>) {
        self.out.finish();
        println!("{} {}", "✓".green(), self.title);
    }

    fn end_with_warning(mut self: Box<Self>, message: &str) {
        self.out.finish();
        println!("{} {}: {}", "⚠".yellow(), self.title, message);
    }

    fn end_with_failure(mut self: Box<Self>, message: &str) {
        self.out.finish();
        println!("{} {}: {}", "✗".red(), self.title, message.red());
    }
}

/// Prefixes every line written through it with a fixed indent.
pub struct IndentWriter<W: Write> {
    inner: W,
    at_line_start: bool,
}

impl<W: Write> IndentWriter<W> {
    const INDENT: &'static [u8] = b"    ";

    pub fn new(inner: W) -> Self {
        Self {
            inner,
            at_line_start: true,
        }
    }

    /// Terminate a trailing partial line so the next output starts cleanly.
    pub fn finish(&mut self) {
        if !self.at_line_start {
            let _ = self.inner.write_all(b"\n");
            self.at_line_start = true;
        }
        let _ = self.inner.flush();
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for IndentWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for chunk in buf.split_inclusive(|b| *b == b'\n') {
            if self.at_line_start {
                self.inner.write_all(Self::INDENT)?;
            }
            self.inner.write_all(chunk)?;
            self.at_line_start = chunk.ends_with(b"\n");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

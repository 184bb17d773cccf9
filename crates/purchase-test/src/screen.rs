//! Display surfaces the controller writes progress and results to.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::summary::TestSummary;

/// Display surface owned by the controller.
pub trait ResultScreen: Send {
    /// Makes the screen visible. Called once when the run starts.
    fn show(&mut self);

    /// Appends a progress line.
    fn log(&mut self, line: &str);

    /// Shows the final results. Called once when the last test completes.
    fn show_results(&mut self, summary: &TestSummary);
}

/// Screen writing plain text to any writer (stdout by default).
pub struct ConsoleScreen<W: Write + Send = std::io::Stdout> {
    out: W,
}

impl ConsoleScreen {
    /// Creates a screen writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleScreen<W> {
    /// Creates a screen writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "failed to write to screen");
        }
    }
}

impl<W: Write + Send> ResultScreen for ConsoleScreen<W> {
    fn show(&mut self) {
        self.write_line("Purchase tests");
        self.write_line("==============");
    }

    fn log(&mut self, line: &str) {
        self.write_line(line);
    }

    fn show_results(&mut self, summary: &TestSummary) {
        self.write_line("");
        self.write_line(&format!(
            "{} of {} tests succeeded",
            summary.succeeded, summary.total
        ));
        for failed in &summary.failed {
            self.write_line(&format!("  FAILED {}: {}", failed.name, failed.reason));
        }
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "failed to flush screen");
        }
    }
}

/// Everything a [`RecordingScreen`] received.
#[derive(Debug, Clone, Default)]
pub struct ScreenRecord {
    /// Number of `show` calls.
    pub shown: usize,
    /// Logged lines in order.
    pub lines: Vec<String>,
    /// Results passed to `show_results`, one entry per call.
    pub results: Vec<TestSummary>,
}

/// Screen keeping everything in memory.
///
/// Clones share the same record, so a test can keep one clone while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingScreen {
    record: Arc<Mutex<ScreenRecord>>,
}

impl RecordingScreen {
    /// Creates an empty recording screen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the record.
    #[must_use]
    pub fn record(&self) -> ScreenRecord {
        self.record.lock().clone()
    }
}

impl ResultScreen for RecordingScreen {
    fn show(&mut self) {
        self.record.lock().shown += 1;
    }

    fn log(&mut self, line: &str) {
        self.record.lock().lines.push(line.to_string());
    }

    fn show_results(&mut self, summary: &TestSummary) {
        self.record.lock().results.push(summary.clone());
    }
}

//! The test capability and the completion channel tests report through.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Identity of a test within one controller run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestId(uuid::Uuid);

impl TestId {
    /// Creates a new random test ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for TestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named unit of purchase testing.
///
/// The controller calls [`PurchaseTest::start_test`] once. The test must
/// eventually report exactly one outcome through the [`TestReporter`],
/// either from inside `start_test` or later from a callback holding a
/// reporter clone.
///
/// # Example
///
/// ```rust,ignore
/// struct AlwaysPasses;
///
/// #[async_trait]
/// impl PurchaseTest for AlwaysPasses {
///     fn name(&self) -> &str { "always passes" }
///
///     async fn start_test(&mut self, reporter: TestReporter) {
///         reporter.succeeded();
///     }
/// }
/// ```
#[async_trait]
pub trait PurchaseTest: Send {
    /// Display name recorded on failure.
    fn name(&self) -> &str;

    /// Starts the test.
    async fn start_test(&mut self, reporter: TestReporter);
}

/// What a test told the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReportKind {
    Succeeded,
    Failed(String),
    Log(String),
}

/// A message on the controller's report channel.
#[derive(Debug, Clone)]
pub(crate) struct TestReport {
    pub(crate) id: TestId,
    pub(crate) kind: ReportKind,
}

/// Completion handle given to a running test.
///
/// Cheap to clone; listeners that finish a test asynchronously keep a
/// clone. Reports sent after the controller is gone are dropped.
#[derive(Debug, Clone)]
pub struct TestReporter {
    id: TestId,
    name: Arc<str>,
    tx: mpsc::UnboundedSender<TestReport>,
}

impl TestReporter {
    pub(crate) fn new(id: TestId, name: Arc<str>, tx: mpsc::UnboundedSender<TestReport>) -> Self {
        Self { id, name, tx }
    }

    /// Identity of the test this reporter belongs to.
    #[must_use]
    pub const fn test_id(&self) -> TestId {
        self.id
    }

    /// Name of the test this reporter belongs to.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.name
    }

    /// Reports success.
    pub fn succeeded(&self) {
        self.send(ReportKind::Succeeded);
    }

    /// Reports failure with a reason.
    pub fn failed(&self, reason: impl Into<String>) {
        self.send(ReportKind::Failed(reason.into()));
    }

    /// Writes a line to the controller's screen.
    pub fn log(&self, line: impl Into<String>) {
        self.send(ReportKind::Log(line.into()));
    }

    fn send(&self, kind: ReportKind) {
        if self.tx.send(TestReport { id: self.id, kind }).is_err() {
            tracing::debug!(test = %self.name, "controller gone, dropping report");
        }
    }
}

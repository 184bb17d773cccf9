//! Sequential test controller.
//!
//! Owns an ordered queue of tests and runs exactly one at a time: the
//! queue head. Only the controller calls [`PurchaseTest::start_test`],
//! and only on a test that has just become the head. A test finishes by
//! reporting through its [`TestReporter`]; the controller then records
//! the outcome, drops the head and starts the next one. When the queue is
//! empty the results go to the screen and the controller is finished.
//!
//! A test that neither reports nor returns from `start_test` is recorded
//! as failed once [`ControllerConfig::test_timeout`] elapses.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::case::{PurchaseTest, ReportKind, TestId, TestReport, TestReporter};
use crate::config::ControllerConfig;
use crate::error::{Result, TestError};
use crate::screen::ResultScreen;
use crate::suite;
use crate::summary::{FailedTest, FailureReason, TestSummary};

/// Controller lifecycle.
///
/// ```text
/// Idle → Running(head) → Running(next) → … → Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed, not started.
    Idle,
    /// The given test is the queue head and is running.
    Running(TestId),
    /// Every test has reported.
    Finished,
}

struct QueuedTest {
    id: TestId,
    name: Arc<str>,
    test: Box<dyn PurchaseTest>,
}

/// Runs purchase tests one at a time and tallies their outcomes.
pub struct TestController {
    tests: VecDeque<QueuedTest>,
    total: usize,
    succeeded: usize,
    failed: Vec<FailedTest>,
    state: ControllerState,
    screen: Box<dyn ResultScreen>,
    config: ControllerConfig,
    report_tx: mpsc::UnboundedSender<TestReport>,
    report_rx: mpsc::UnboundedReceiver<TestReport>,
    /// When the running test times out.
    deadline: Option<Instant>,
}

impl TestController {
    /// Creates a controller over `tests`, run in the given order.
    #[must_use]
    pub fn new(
        tests: Vec<Box<dyn PurchaseTest>>,
        screen: Box<dyn ResultScreen>,
        config: ControllerConfig,
    ) -> Self {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let tests: VecDeque<QueuedTest> = tests
            .into_iter()
            .map(|test| QueuedTest {
                id: TestId::new(),
                name: Arc::from(test.name()),
                test,
            })
            .collect();

        Self {
            total: tests.len(),
            tests,
            succeeded: 0,
            failed: Vec::new(),
            state: ControllerState::Idle,
            screen,
            config,
            report_tx,
            report_rx,
            deadline: None,
        }
    }

    /// Creates a controller over the built-in purchase suite.
    #[must_use]
    pub fn with_default_suite(screen: Box<dyn ResultScreen>, config: ControllerConfig) -> Self {
        let tests = suite::default_suite(&config.store);
        Self::new(tests, screen, config)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// ID of the running test, if any.
    #[must_use]
    pub fn running(&self) -> Option<TestId> {
        match self.state {
            ControllerState::Running(id) => Some(id),
            _ => None,
        }
    }

    /// IDs of the tests not yet completed, head first.
    #[must_use]
    pub fn pending(&self) -> Vec<TestId> {
        self.tests.iter().map(|t| t.id).collect()
    }

    /// Snapshot of the tallies so far.
    #[must_use]
    pub fn summary(&self) -> TestSummary {
        TestSummary {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed.clone(),
        }
    }

    /// Returns the configured per-test timeout.
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        self.config.test_timeout
    }

    /// Shows the screen and starts the queue head.
    ///
    /// # Errors
    /// Returns [`TestError::AlreadyStarted`] on a second call.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ControllerState::Idle {
            return Err(TestError::AlreadyStarted);
        }
        tracing::info!(tests = self.total, "starting purchase tests");
        self.screen.show();
        self.run_next_test().await;
        Ok(())
    }

    /// Records a failure for the running test and starts the next one.
    ///
    /// # Errors
    /// Returns [`TestError::NotHead`] if `id` is not the running test; the
    /// report is ignored.
    pub async fn test_failed(&mut self, id: TestId, reason: impl Into<String>) -> Result<()> {
        self.finish_head(id, Err(FailureReason::reported(reason))).await
    }

    /// Records a success for the running test and starts the next one.
    ///
    /// # Errors
    /// Returns [`TestError::NotHead`] if `id` is not the running test; the
    /// report is ignored.
    pub async fn test_succeeded(&mut self, id: TestId) -> Result<()> {
        self.finish_head(id, Ok(())).await
    }

    /// Runs every test to completion and returns the tallies.
    ///
    /// Outcomes come from the tests' reporters.
    ///
    /// # Errors
    /// Returns [`TestError::AlreadyStarted`] if the controller was started
    /// before.
    pub async fn run(&mut self) -> Result<TestSummary> {
        self.start().await?;
        while let Some(id) = self.running() {
            let outcome = self.wait_for_head(id).await;
            if let Err(e) = self.finish_head(id, outcome).await {
                tracing::error!(error = %e, "failed to record test outcome");
                break;
            }
        }
        Ok(self.summary())
    }

    /// Waits for the running test's report until its deadline.
    async fn wait_for_head(&mut self, id: TestId) -> std::result::Result<(), FailureReason> {
        let timeout = self.config.test_timeout;
        let deadline = self.deadline.unwrap_or_else(|| Instant::now() + timeout);
        let Some(name) = self.tests.front().map(|t| Arc::clone(&t.name)) else {
            return Err(FailureReason::reported("no running test"));
        };

        let outcome = tokio::time::timeout_at(
            deadline,
            wait_for_outcome(id, &name, &mut self.report_rx, &mut *self.screen),
        )
        .await;

        match outcome {
            Ok(Some(ReportKind::Succeeded)) => Ok(()),
            Ok(Some(ReportKind::Failed(reason))) => Err(FailureReason::reported(reason)),
            Ok(Some(ReportKind::Log(_)) | None) => {
                Err(FailureReason::reported("report channel closed"))
            }
            Err(_) => Err(FailureReason::timed_out(timeout)),
        }
    }

    async fn finish_head(
        &mut self,
        id: TestId,
        outcome: std::result::Result<(), FailureReason>,
    ) -> Result<()> {
        self.complete_head(id, outcome)?;
        self.run_next_test().await;
        Ok(())
    }

    /// Records the head's outcome and removes it from the queue.
    fn complete_head(
        &mut self,
        id: TestId,
        outcome: std::result::Result<(), FailureReason>,
    ) -> Result<()> {
        let head = self.take_head(id)?;
        match outcome {
            Ok(()) => {
                tracing::info!(test = %head.name, "test succeeded");
                self.screen.log(&format!("[{}] succeeded", head.name));
                self.succeeded += 1;
            }
            Err(reason) => {
                tracing::warn!(test = %head.name, %reason, "test failed");
                self.screen.log(&format!("[{}] FAILED: {reason}", head.name));
                self.failed.push(FailedTest {
                    name: head.name.to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Removes the head if `id` is the running test.
    fn take_head(&mut self, id: TestId) -> Result<QueuedTest> {
        let running = self.running();
        if running != Some(id) {
            tracing::warn!(test = %id, ?running, "ignoring report from a test that is not running");
            return Err(TestError::NotHead {
                running,
                actual: id,
            });
        }
        self.deadline = None;
        self.tests
            .pop_front()
            .ok_or(TestError::NotHead { running, actual: id })
    }

    /// Starts the queue head, or finishes when the queue is empty.
    ///
    /// A head whose `start_test` does not return before its deadline is
    /// recorded as timed out and the next head is started.
    async fn run_next_test(&mut self) {
        let timeout = self.config.test_timeout;
        loop {
            let Some(head) = self.tests.front_mut() else {
                self.finish_testing();
                return;
            };
            let id = head.id;
            let deadline = Instant::now() + timeout;
            self.state = ControllerState::Running(id);
            self.deadline = Some(deadline);

            let reporter = TestReporter::new(id, Arc::clone(&head.name), self.report_tx.clone());
            tracing::debug!(test = %head.name, ?timeout, "starting test");
            if tokio::time::timeout_at(deadline, head.test.start_test(reporter))
                .await
                .is_ok()
            {
                return;
            }

            if let Err(e) = self.complete_head(id, Err(FailureReason::timed_out(timeout))) {
                tracing::error!(error = %e, "failed to record stalled test");
                return;
            }
        }
    }

    fn finish_testing(&mut self) {
        self.state = ControllerState::Finished;
        self.deadline = None;
        let summary = self.summary();
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "purchase tests finished"
        );
        self.screen.show_results(&summary);
    }
}

/// Waits for the running test's outcome, forwarding its log lines.
///
/// Reports from other tests (late or duplicate) are dropped.
async fn wait_for_outcome(
    id: TestId,
    name: &str,
    rx: &mut mpsc::UnboundedReceiver<TestReport>,
    screen: &mut dyn ResultScreen,
) -> Option<ReportKind> {
    while let Some(report) = rx.recv().await {
        if report.id != id {
            tracing::warn!(test = %report.id, "dropping report from a test that is not running");
            continue;
        }
        match report.kind {
            ReportKind::Log(line) => screen.log(&format!("[{name}] {line}")),
            outcome => return Some(outcome),
        }
    }
    None
}

impl Drop for TestController {
    fn drop(&mut self) {
        if !self.tests.is_empty() {
            tracing::warn!(
                remaining = self.tests.len(),
                "controller dropped with unfinished tests"
            );
        }
    }
}

impl std::fmt::Debug for TestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestController")
            .field("state", &self.state)
            .field("pending", &self.tests.len())
            .field("succeeded", &self.succeeded)
            .field("failed", &self.failed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::RecordingScreen;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Scripted test outcome.
    #[derive(Clone, Copy)]
    enum Script {
        Pass,
        Fail,
        /// Returns from `start_test` without reporting.
        Silent,
        /// Never returns from `start_test`.
        Stall,
        PassTwice,
    }

    struct Scripted {
        name: String,
        script: Script,
        started: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PurchaseTest for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start_test(&mut self, reporter: TestReporter) {
            self.started.lock().push(self.name.clone());
            reporter.log("started");
            match self.script {
                Script::Pass => reporter.succeeded(),
                Script::Fail => reporter.failed("scripted failure"),
                Script::Silent => {}
                Script::Stall => std::future::pending::<()>().await,
                Script::PassTwice => {
                    reporter.succeeded();
                    reporter.succeeded();
                }
            }
        }
    }

    fn controller(
        scripts: &[(&str, Script)],
    ) -> (TestController, RecordingScreen, Arc<Mutex<Vec<String>>>) {
        let started = Arc::new(Mutex::new(Vec::new()));
        let tests: Vec<Box<dyn PurchaseTest>> = scripts
            .iter()
            .map(|(name, script)| {
                Box::new(Scripted {
                    name: (*name).to_string(),
                    script: *script,
                    started: Arc::clone(&started),
                }) as Box<dyn PurchaseTest>
            })
            .collect();
        let screen = RecordingScreen::new();
        let config = ControllerConfig::default().with_test_timeout(Duration::from_millis(50));
        let controller = TestController::new(tests, Box::new(screen.clone()), config);
        (controller, screen, started)
    }

    #[test]
    fn test_new_controller_is_idle() {
        let (controller, screen, started) = controller(&[("a", Script::Pass)]);
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.pending().len(), 1);
        assert_eq!(screen.record().shown, 0);
        assert!(started.lock().is_empty());
    }

    #[tokio::test]
    async fn test_start_starts_only_the_head() {
        let (mut controller, screen, started) =
            controller(&[("a", Script::Pass), ("b", Script::Pass)]);
        controller.start().await.unwrap();

        let head = controller.pending()[0];
        assert_eq!(controller.state(), ControllerState::Running(head));
        assert_eq!(*started.lock(), vec!["a"]);
        assert_eq!(screen.record().shown, 1);
        assert!(matches!(
            controller.start().await,
            Err(TestError::AlreadyStarted)
        ));
        assert_eq!(*started.lock(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_each_completion_starts_the_next_test() {
        let (mut controller, screen, started) =
            controller(&[("a", Script::Pass), ("b", Script::Pass), ("c", Script::Pass)]);
        let ids = controller.pending();
        controller.start().await.unwrap();

        controller.test_succeeded(ids[0]).await.unwrap();
        assert_eq!(controller.running(), Some(ids[1]));
        assert_eq!(*started.lock(), vec!["a", "b"]);

        controller.test_failed(ids[1], "bad").await.unwrap();
        assert_eq!(controller.running(), Some(ids[2]));
        assert_eq!(*started.lock(), vec!["a", "b", "c"]);

        controller.test_succeeded(ids[2]).await.unwrap();

        assert_eq!(controller.state(), ControllerState::Finished);
        // Every completed test was started exactly once.
        assert_eq!(*started.lock(), vec!["a", "b", "c"]);
        let summary = controller.summary();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed_names(), vec!["b"]);
        assert_eq!(screen.record().results, vec![summary]);
    }

    #[tokio::test]
    async fn test_report_from_non_head_is_rejected() {
        let (mut controller, _, started) =
            controller(&[("a", Script::Pass), ("b", Script::Pass)]);
        let ids = controller.pending();

        // Before start nothing is running.
        assert!(matches!(
            controller.test_succeeded(ids[0]).await,
            Err(TestError::NotHead { running: None, .. })
        ));
        assert!(started.lock().is_empty());

        controller.start().await.unwrap();
        let err = controller.test_failed(ids[1], "early").await.unwrap_err();
        assert!(matches!(err, TestError::NotHead { running: Some(r), .. } if r == ids[0]));
        assert_eq!(controller.pending().len(), 2);
        assert!(controller.summary().failed.is_empty());
        assert_eq!(*started.lock(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_controller_finishes_on_start() {
        let (mut controller, screen, _) = controller(&[]);
        controller.start().await.unwrap();
        assert_eq!(controller.state(), ControllerState::Finished);
        assert_eq!(screen.record().results.len(), 1);
        assert!(controller.summary().all_passed());
    }

    #[tokio::test]
    async fn test_stalled_start_is_timed_out_and_next_started() {
        let (mut controller, _, started) =
            controller(&[("stall", Script::Stall), ("after", Script::Pass)]);
        let ids = controller.pending();

        controller.start().await.unwrap();

        assert_eq!(controller.running(), Some(ids[1]));
        assert_eq!(*started.lock(), vec!["stall", "after"]);
        assert_eq!(
            controller.summary().failed,
            vec![FailedTest {
                name: "stall".into(),
                reason: FailureReason::timed_out(Duration::from_millis(50)),
            }]
        );
    }

    #[tokio::test]
    async fn test_run_executes_in_order() {
        let (mut controller, screen, started) = controller(&[
            ("create", Script::Pass),
            ("purchase", Script::Fail),
            ("receipt", Script::Pass),
        ]);

        let summary = controller.run().await.unwrap();

        assert_eq!(*started.lock(), vec!["create", "purchase", "receipt"]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed_names(), vec!["purchase"]);
        assert_eq!(
            summary.failed[0].reason,
            FailureReason::reported("scripted failure")
        );

        let record = screen.record();
        assert!(record.lines.contains(&"[create] started".to_string()));
        assert!(record.lines.contains(&"[purchase] FAILED: scripted failure".to_string()));
        assert_eq!(record.results.len(), 1);
    }

    #[tokio::test]
    async fn test_silent_and_stalled_tests_time_out_during_run() {
        let (mut controller, _, started) = controller(&[
            ("silent", Script::Silent),
            ("stall", Script::Stall),
            ("after", Script::Pass),
        ]);

        let summary = controller.run().await.unwrap();

        assert_eq!(*started.lock(), vec!["silent", "stall", "after"]);
        assert_eq!(summary.succeeded, 1);
        let timed_out = FailureReason::timed_out(Duration::from_millis(50));
        assert_eq!(
            summary.failed,
            vec![
                FailedTest {
                    name: "silent".into(),
                    reason: timed_out.clone(),
                },
                FailedTest {
                    name: "stall".into(),
                    reason: timed_out,
                },
            ]
        );
        assert_eq!(controller.state(), ControllerState::Finished);
    }

    #[tokio::test]
    async fn test_duplicate_report_does_not_complete_next_test() {
        let (mut controller, _, _) = controller(&[
            ("double", Script::PassTwice),
            ("silent", Script::Silent),
        ]);

        let summary = controller.run().await.unwrap();

        // The stray second success must not be credited to "silent".
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed_names(), vec!["silent"]);
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let (mut controller, _, _) = controller(&[("a", Script::Pass)]);
        tokio_test::block_on(async {
            controller.run().await.unwrap();
            assert!(matches!(controller.run().await, Err(TestError::AlreadyStarted)));
        });
    }
}

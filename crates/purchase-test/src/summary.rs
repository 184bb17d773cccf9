//! Run results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a test was recorded as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureReason {
    /// The test reported failure.
    Reported {
        /// Reason given by the test.
        message: String,
    },
    /// The test did not report within the configured timeout.
    TimedOut {
        /// The timeout in milliseconds.
        timeout_ms: u64,
    },
}

impl FailureReason {
    /// Failure reported by the test itself.
    #[must_use]
    pub fn reported(message: impl Into<String>) -> Self {
        Self::Reported {
            message: message.into(),
        }
    }

    /// Failure recorded by the controller after a timeout.
    #[must_use]
    pub fn timed_out(timeout: Duration) -> Self {
        Self::TimedOut {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reported { message } => f.write_str(message),
            Self::TimedOut { timeout_ms } => write!(
                f,
                "timed out after {}",
                humantime::format_duration(Duration::from_millis(*timeout_ms))
            ),
        }
    }
}

/// A test recorded as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    /// Test display name.
    pub name: String,
    /// Why it failed.
    pub reason: FailureReason,
}

/// Tallies of a controller run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Number of tests constructed.
    pub total: usize,
    /// Number of tests that succeeded.
    pub succeeded: usize,
    /// Failed tests in the order they failed.
    pub failed: Vec<FailedTest>,
}

impl TestSummary {
    /// Number of tests that reported either outcome.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    /// Returns true if every constructed test succeeded.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.total
    }

    /// Names of failed tests in failure order.
    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.name.as_str()).collect()
    }
}

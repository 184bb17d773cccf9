//! Test controller error types.

use crate::case::TestId;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Test controller errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// A completion was reported for a test that is not running.
    #[error("test {actual} is not the running test (running: {})", running_label(.running))]
    NotHead {
        /// The running test, if any.
        running: Option<TestId>,
        /// The test that reported.
        actual: TestId,
    },

    /// The controller was started twice.
    #[error("controller already started")]
    AlreadyStarted,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Purchase layer error.
    #[error("purchase error: {0}")]
    Purchase(#[from] purchase_core::PurchaseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn running_label(running: &Option<TestId>) -> String {
    running.map_or_else(|| "none".to_string(), |id| id.to_string())
}

impl TestError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # purchase-test
//!
//! Sequential test controller for purchase flows.
//!
//! - **Controller**: runs [`PurchaseTest`]s one at a time, in order, and
//!   tallies successes and failures
//! - **Reporting**: each running test gets a [`TestReporter`]; a test that
//!   never reports is failed after the configured timeout
//! - **Screens**: results go to a [`ResultScreen`]
//! - **Suite**: the built-in purchase tests run against a simulated store
//!
//! ## Example
//!
//! ```rust,no_run
//! use purchase_test::{ConsoleScreen, ControllerConfig, TestController};
//!
//! # async fn run() -> purchase_test::Result<()> {
//! let mut controller = TestController::with_default_suite(
//!     Box::new(ConsoleScreen::stdout()),
//!     ControllerConfig::default(),
//! );
//! let summary = controller.run().await?;
//! assert!(summary.all_passed());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod case;
pub mod config;
pub mod controller;
pub mod error;
pub mod screen;
pub mod suite;
pub mod summary;

pub use case::{PurchaseTest, TestId, TestReporter};
pub use config::ControllerConfig;
pub use controller::{ControllerState, TestController};
pub use error::{Result, TestError};
pub use screen::{ConsoleScreen, RecordingScreen, ResultScreen, ScreenRecord};
pub use suite::default_suite;
pub use summary::{FailedTest, FailureReason, TestSummary};

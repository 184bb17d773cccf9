//! purchase-kit: in-app purchase products and a sequential purchase test
//! controller.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use purchase_kit::prelude::*;
//!
//! # async fn run() -> Result<(), TestError> {
//! let mut controller =
//!     TestController::with_default_suite(Box::new(ConsoleScreen::stdout()), ControllerConfig::default());
//! let summary = controller.run().await?;
//! println!("{} of {} passed", summary.succeeded, summary.total);
//! # Ok(())
//! # }
//! ```

pub use purchase_core as core;
pub use purchase_endian as endian;
pub use purchase_test as test;

/// Prelude module for common imports.
pub mod prelude {
    pub use purchase_core::{
        Product, ProductHandle, ProductListener, ProductState, PurchaseError, PurchaseEvent,
        PurchaseEventData, PurchaseManager, PurchaseManagerListener, PurchasePlatform, Receipt,
        SimulatedStore, SimulatedStoreConfig,
    };
    pub use purchase_endian::{BYTE_ORDER, ByteOrder};
    pub use purchase_test::{
        ConsoleScreen, ControllerConfig, PurchaseTest, RecordingScreen, ResultScreen,
        TestController, TestError, TestReporter, TestSummary,
    };
}

// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # purchase-core
//!
//! Purchasable products over a native purchase API.
//!
//! - [`Product`] wraps one platform handle and re-dispatches the platform's
//!   purchase events to its [`ProductListener`]s
//! - [`PurchaseEvent`] decodes the platform's flat [`PurchaseEventData`]
//!   record
//! - [`PurchaseManager`] owns a [`PurchasePlatform`] and routes events to the
//!   product owning each handle
//! - [`SimulatedStore`] is an in-memory platform for tests
//!
//! ## Example
//!
//! ```rust
//! use purchase_core::{ProductState, PurchaseManager, SimulatedStore};
//!
//! let mut manager = PurchaseManager::new(SimulatedStore::default());
//! let handle = manager.create_product("sku_1")?;
//! assert!(manager.product(handle).and_then(|p| p.handle()).is_none());
//!
//! manager.pump();
//! let product = manager.product(handle).unwrap();
//! assert_eq!(product.handle(), Some(handle));
//! assert_eq!(product.state(), ProductState::Created);
//! # Ok::<(), purchase_core::PurchaseError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod listener;
pub mod manager;
pub mod platform;
pub mod product;
pub mod receipt;
pub mod simulated;
pub mod types;

pub use error::{PurchaseError, Result};
pub use event::{PurchaseEvent, PurchaseEventData, ReceiptOutcome, RequestOutcome};
pub use listener::{ListenerRegistry, ProductListener};
pub use manager::{PurchaseManager, PurchaseManagerListener};
pub use platform::PurchasePlatform;
pub use product::Product;
pub use receipt::Receipt;
pub use simulated::{CatalogEntry, SimulatedStore, SimulatedStoreConfig};
pub use types::{ProductHandle, ProductState};

//! The native purchase API boundary.
//!
//! Implementations forward calls to the store and queue the resulting
//! purchase events; [`crate::PurchaseManager`] drains them with
//! [`PurchasePlatform::poll_event`].

use crate::error::Result;
use crate::event::PurchaseEventData;
use crate::types::ProductHandle;

/// Native purchase API.
///
/// Calls return as soon as the request is queued; outcomes arrive later as
/// events.
pub trait PurchasePlatform: Send {
    /// Returns true if the device can make purchases.
    fn is_supported(&self) -> bool;

    /// Registers a product identifier and returns the handle the platform
    /// will use in its events. Confirmation arrives as a create event.
    fn create_product(&mut self, product_id: &str) -> Result<ProductHandle>;

    /// Starts a purchase of `quantity` items.
    fn request_purchase(&mut self, handle: ProductHandle, quantity: u32) -> Result<()>;

    /// Asks the store to verify the product's receipt.
    fn verify_receipt(&mut self, handle: ProductHandle) -> Result<()>;

    /// Asks the store to replay previously completed transactions.
    fn restore_transactions(&mut self) -> Result<()>;

    /// Releases a product handle.
    fn destroy_product(&mut self, handle: ProductHandle) -> Result<()>;

    /// Takes the next pending event, if any.
    fn poll_event(&mut self) -> Option<PurchaseEventData>;
}

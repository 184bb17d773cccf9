//! Product manager - owns the platform and every product it created.
//!
//! Routes inbound purchase events to the product that owns the handle and
//! materializes products for restored and refunded transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PurchaseError, Result};
use crate::event::{PurchaseEvent, PurchaseEventData};
use crate::platform::PurchasePlatform;
use crate::product::Product;
use crate::types::{ProductHandle, ProductState};

/// Receives notifications about transactions not started by this session.
pub trait PurchaseManagerListener: Send + Sync {
    /// A previous purchase was restored.
    fn product_restored(&self, product: &Product);

    /// Restoring transactions failed.
    fn restore_failed(&self, _error_code: i32) {}

    /// A previous purchase was refunded.
    fn product_refunded(&self, _product: &Product) {}
}

/// Owns a purchase platform and the products created through it.
pub struct PurchaseManager<P: PurchasePlatform> {
    platform: P,
    products: BTreeMap<ProductHandle, Product>,
    listeners: Vec<Arc<dyn PurchaseManagerListener>>,
}

impl<P: PurchasePlatform> PurchaseManager<P> {
    /// Creates a manager over a platform.
    #[must_use]
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            products: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Returns the platform.
    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the platform mutably.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Creates a pending product for a store identifier.
    ///
    /// Returns the handle the platform will use in its events. The product's
    /// own [`Product::handle`] stays unset until the create event arrives.
    ///
    /// # Errors
    /// Returns [`PurchaseError::NotSupported`] if the device cannot make
    /// purchases, or the platform's error.
    pub fn create_product(&mut self, product_id: &str) -> Result<ProductHandle> {
        if !self.platform.is_supported() {
            return Err(PurchaseError::NotSupported);
        }
        let handle = self.platform.create_product(product_id)?;
        if self.products.contains_key(&handle) {
            return Err(PurchaseError::platform(format!(
                "platform reused live handle {handle}"
            )));
        }
        tracing::debug!(product = product_id, handle = %handle, "product requested");
        self.products.insert(handle, Product::new(product_id));
        Ok(handle)
    }

    /// Returns the product registered under `handle`.
    #[must_use]
    pub fn product(&self, handle: ProductHandle) -> Option<&Product> {
        self.products.get(&handle)
    }

    /// Returns the product registered under `handle` mutably.
    pub fn product_mut(&mut self, handle: ProductHandle) -> Option<&mut Product> {
        self.products.get_mut(&handle)
    }

    /// Iterates over all products in handle order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Starts a purchase of a confirmed product.
    ///
    /// # Errors
    /// Fails if the handle is unknown or the product is not purchasable.
    pub fn request_purchase(&mut self, handle: ProductHandle, quantity: u32) -> Result<()> {
        let product = self.confirmed(handle)?;
        if !product.state().can_purchase() {
            return Err(PurchaseError::state(format!(
                "cannot purchase product in state {}",
                product.state()
            )));
        }
        if quantity == 0 {
            return Err(PurchaseError::state("quantity must be at least 1"));
        }
        self.platform.request_purchase(handle, quantity)
    }

    /// Asks the store to verify the receipt of a confirmed product.
    ///
    /// # Errors
    /// Fails if the handle is unknown or unconfirmed.
    pub fn verify_receipt(&mut self, handle: ProductHandle) -> Result<()> {
        self.confirmed(handle)?;
        self.platform.verify_receipt(handle)
    }

    /// Asks the store to replay previous transactions.
    ///
    /// # Errors
    /// Returns [`PurchaseError::NotSupported`] or the platform's error.
    pub fn restore_transactions(&mut self) -> Result<()> {
        if !self.platform.is_supported() {
            return Err(PurchaseError::NotSupported);
        }
        self.platform.restore_transactions()
    }

    /// Drops a product and releases its platform handle.
    ///
    /// The product is kept if the platform refuses.
    ///
    /// # Errors
    /// Fails if the handle is unknown or the platform refuses.
    pub fn destroy_product(&mut self, handle: ProductHandle) -> Result<Product> {
        if !self.products.contains_key(&handle) {
            return Err(PurchaseError::UnknownProduct(handle));
        }
        self.platform.destroy_product(handle)?;
        self.products
            .remove(&handle)
            .ok_or(PurchaseError::UnknownProduct(handle))
    }

    /// Registers a manager listener. Returns false if already registered.
    pub fn add_listener(&mut self, listener: Arc<dyn PurchaseManagerListener>) -> bool {
        if self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Deregisters a manager listener.
    pub fn remove_listener(&mut self, listener: &Arc<dyn PurchaseManagerListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    /// Routes one raw event to its product.
    ///
    /// # Errors
    /// Malformed records and events for unknown handles are rejected; the
    /// product's own errors are passed through.
    pub fn dispatch(&mut self, data: &PurchaseEventData) -> Result<()> {
        let event = PurchaseEvent::decode(data)?;
        let handle = event.handle();

        match (&event, self.products.contains_key(&handle)) {
            (PurchaseEvent::Restore { outcome: Err(code), .. }, _) => {
                tracing::warn!(error_code = *code, "restore failed");
                let code = *code;
                for listener in &self.listeners {
                    listener.restore_failed(code);
                }
                Ok(())
            }
            (PurchaseEvent::Restore { outcome: Ok(receipt), .. }, false) => {
                let product = Product::from_handle(handle, ProductState::Restored, receipt.clone());
                tracing::info!(handle = %handle, product = ?product.product_id(), "product restored");
                for listener in &self.listeners {
                    listener.product_restored(&product);
                }
                self.products.insert(handle, product);
                Ok(())
            }
            (PurchaseEvent::Refund { .. }, false) => {
                let product = Product::from_handle(handle, ProductState::Refunded, None);
                tracing::info!(handle = %handle, "product refunded");
                for listener in &self.listeners {
                    listener.product_refunded(&product);
                }
                self.products.insert(handle, product);
                Ok(())
            }
            (_, false) => Err(PurchaseError::UnknownProduct(handle)),
            (_, true) => {
                let product = self
                    .products
                    .get_mut(&handle)
                    .ok_or(PurchaseError::UnknownProduct(handle))?;
                product.handle_event(&event)?;
                let product = &*product;
                match &event {
                    PurchaseEvent::Restore { .. } => {
                        for listener in &self.listeners {
                            listener.product_restored(product);
                        }
                    }
                    PurchaseEvent::Refund { .. } => {
                        for listener in &self.listeners {
                            listener.product_refunded(product);
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
        }
    }

    /// Drains the platform's pending events, dispatching each in order.
    ///
    /// Rejected events are logged and skipped. Returns the number of events
    /// taken from the platform.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while let Some(data) = self.platform.poll_event() {
            count += 1;
            if let Err(e) = self.dispatch(&data) {
                tracing::warn!(
                    event_type = data.event_type,
                    handle = data.product_handle,
                    error = %e,
                    "purchase event rejected"
                );
            }
        }
        count
    }

    fn confirmed(&self, handle: ProductHandle) -> Result<&Product> {
        let product = self
            .products
            .get(&handle)
            .ok_or(PurchaseError::UnknownProduct(handle))?;
        if product.handle().is_none() {
            return Err(PurchaseError::state(format!(
                "product {handle} not confirmed by the platform"
            )));
        }
        Ok(product)
    }
}

impl<P: PurchasePlatform + std::fmt::Debug> std::fmt::Debug for PurchaseManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseManager")
            .field("platform", &self.platform)
            .field("products", &self.products)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

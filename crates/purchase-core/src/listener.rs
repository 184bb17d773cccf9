//! Product listeners and the shared registry they live in.
//!
//! The registry is shared between a [`Product`] and whoever holds a clone
//! of it, so listeners can deregister themselves (or each other) while an
//! event is being dispatched. Dispatch walks a snapshot and re-checks
//! membership before each call: a listener removed mid-dispatch is not
//! notified for that event.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::product::Product;
use crate::receipt::Receipt;

/// Receives purchase lifecycle notifications for one product.
///
/// Only the create outcome is mandatory; the purchase and receipt
/// callbacks default to no-ops.
pub trait ProductListener: Send + Sync {
    /// The platform confirmed the product.
    fn product_valid(&self, product: &Product);

    /// The platform rejected the product identifier.
    fn product_invalid(&self, product: &Product);

    /// A purchase request started.
    fn purchase_started(&self, _product: &Product) {}

    /// A purchase request completed.
    fn purchase_completed(&self, _product: &Product) {}

    /// A purchase request failed with a platform error code.
    fn purchase_failed(&self, _product: &Product, _error_code: i32) {}

    /// A receipt was verified and attached to the product.
    fn receipt_valid(&self, _product: &Product, _receipt: &Receipt) {}

    /// The store rejected the product's receipt.
    fn receipt_invalid(&self, _product: &Product) {}

    /// Receipt verification could not run.
    fn receipt_error(&self, _product: &Product, _error_code: i32) {}
}

/// Shared, ordered set of product listeners.
///
/// Listeners are compared by `Arc` identity; each is held at most once.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Vec<Arc<dyn ProductListener>>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Returns false if it was already registered.
    pub fn add(&self, listener: Arc<dyn ProductListener>) -> bool {
        let mut listeners = self.inner.lock();
        if listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn ProductListener>) -> bool {
        let mut listeners = self.inner.lock();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// Returns true if the listener is registered.
    #[must_use]
    pub fn contains(&self, listener: &Arc<dyn ProductListener>) -> bool {
        self.inner.lock().iter().any(|l| Arc::ptr_eq(l, listener))
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Calls `notify` for each listener still registered at its turn.
    ///
    /// The lock is not held while a listener runs.
    pub(crate) fn for_each_live(&self, mut notify: impl FnMut(&dyn ProductListener)) {
        let snapshot: Vec<Arc<dyn ProductListener>> = self.inner.lock().clone();
        for listener in snapshot {
            if self.contains(&listener) {
                notify(listener.as_ref());
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

//! The purchasable product adapter.
//!
//! A [`Product`] wraps one platform handle, follows the platform's purchase
//! events through its lifecycle, and re-dispatches them as typed calls on
//! its [`ProductListener`]s. It never polls the platform: every transition
//! is driven by [`Product::handle_purchase_event`].

use std::sync::Arc;

use crate::error::{PurchaseError, Result};
use crate::event::{PurchaseEvent, PurchaseEventData, ReceiptOutcome, RequestOutcome};
use crate::listener::{ListenerRegistry, ProductListener};
use crate::receipt::Receipt;
use crate::types::{ProductHandle, ProductState};

/// One purchasable item.
#[derive(Debug)]
pub struct Product {
    product_id: Option<String>,
    handle: Option<ProductHandle>,
    state: ProductState,
    receipt: Option<Receipt>,
    listeners: ListenerRegistry,
}

impl Product {
    /// Creates a pending product bound to a store product identifier.
    ///
    /// The handle stays unset until the platform confirms the product.
    #[must_use]
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            handle: None,
            state: ProductState::Pending,
            receipt: None,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Rebuilds a product from a platform handle (restored or refunded
    /// transactions).
    pub(crate) fn from_handle(
        handle: ProductHandle,
        state: ProductState,
        receipt: Option<Receipt>,
    ) -> Self {
        Self {
            product_id: receipt.as_ref().map(|r| r.product_id.clone()),
            handle: Some(handle),
            state,
            receipt,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Store product identifier, if known.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        self.product_id.as_deref()
    }

    /// Platform handle, or `None` until the platform confirms the product.
    #[must_use]
    pub const fn handle(&self) -> Option<ProductHandle> {
        self.handle
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProductState {
        self.state
    }

    /// Receipt attached by a verified receipt event.
    #[must_use]
    pub const fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Registers a listener. Returns false if it was already registered.
    pub fn add_product_listener(&self, listener: Arc<dyn ProductListener>) -> bool {
        let added = self.listeners.add(listener);
        if !added {
            tracing::debug!(product = ?self.product_id, "listener already registered");
        }
        added
    }

    /// Deregisters a listener. Returns false if it was not registered.
    pub fn remove_product_listener(&self, listener: &Arc<dyn ProductListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Shared handle to the listener list.
    ///
    /// Listeners may keep a clone to deregister during a callback.
    #[must_use]
    pub fn listeners(&self) -> ListenerRegistry {
        self.listeners.clone()
    }

    /// Handles a raw platform purchase event.
    ///
    /// # Errors
    /// Records with an unknown tag are logged and rejected without touching
    /// the product. See [`Product::handle_event`] for the other failures.
    pub fn handle_purchase_event(&mut self, data: &PurchaseEventData) -> Result<()> {
        let event = PurchaseEvent::decode(data).inspect_err(|e| {
            tracing::warn!(
                product = ?self.product_id,
                event_type = data.event_type,
                state = data.state,
                error = %e,
                "dropping unrecognized purchase event"
            );
        })?;
        self.handle_event(&event)
    }

    /// Handles a decoded purchase event.
    ///
    /// # Errors
    /// - [`PurchaseError::HandleMismatch`]: the event targets another product
    /// - [`PurchaseError::DuplicateReceipt`]: a receipt is already attached
    /// - [`PurchaseError::State`]: the product cannot take the event yet
    pub fn handle_event(&mut self, event: &PurchaseEvent) -> Result<()> {
        tracing::debug!(
            product = ?self.product_id,
            handle = %event.handle(),
            kind = event.kind(),
            state = %self.state,
            "purchase event"
        );

        match event {
            PurchaseEvent::ProductCreate { handle, valid } => {
                self.handle_product_create_event(*handle, *valid)
            }
            PurchaseEvent::Request { handle, outcome } => {
                self.handle_request_event(*handle, *outcome)
            }
            PurchaseEvent::Receipt { handle, outcome } => {
                self.handle_receipt_event(*handle, outcome)
            }
            PurchaseEvent::Restore { handle, outcome } => {
                self.check_handle(*handle)?;
                if let Ok(receipt) = outcome {
                    self.state = ProductState::Restored;
                    if self.receipt.is_none() {
                        self.receipt.clone_from(receipt);
                    }
                }
                Ok(())
            }
            PurchaseEvent::Refund { handle } => {
                self.check_handle(*handle)?;
                self.state = ProductState::Refunded;
                Ok(())
            }
        }
    }

    fn handle_product_create_event(&mut self, handle: ProductHandle, valid: bool) -> Result<()> {
        if let Some(current) = self.handle {
            if current != handle {
                return Err(PurchaseError::HandleMismatch {
                    expected: current,
                    actual: handle,
                });
            }
        }
        if self.state != ProductState::Pending {
            return Err(PurchaseError::state(format!(
                "create event for product in state {}",
                self.state
            )));
        }

        if valid && handle.is_none() {
            return Err(PurchaseError::state("valid create event carries no handle"));
        }

        if valid {
            self.handle = Some(handle);
            self.state = ProductState::Created;
            tracing::info!(product = ?self.product_id, handle = %handle, "product created");
            self.notify(|l, p| l.product_valid(p));
        } else {
            self.state = ProductState::Invalid;
            tracing::warn!(product = ?self.product_id, "product rejected by store");
            self.notify(|l, p| l.product_invalid(p));
        }
        Ok(())
    }

    fn handle_request_event(&mut self, handle: ProductHandle, outcome: RequestOutcome) -> Result<()> {
        self.check_handle(handle)?;

        let in_order = match outcome {
            RequestOutcome::InProgress => self.state.can_purchase(),
            RequestOutcome::Completed | RequestOutcome::Failed(_) => {
                self.state == ProductState::Purchasing
            }
        };
        if !in_order {
            tracing::warn!(
                product = ?self.product_id,
                state = %self.state,
                ?outcome,
                "out-of-order request event"
            );
            return Err(PurchaseError::state(format!(
                "request event {outcome:?} for product in state {}",
                self.state
            )));
        }

        match outcome {
            RequestOutcome::InProgress => {
                self.state = ProductState::Purchasing;
                self.notify(|l, p| l.purchase_started(p));
            }
            RequestOutcome::Completed => {
                self.state = ProductState::Purchased;
                tracing::info!(product = ?self.product_id, "purchase completed");
                self.notify(|l, p| l.purchase_completed(p));
            }
            RequestOutcome::Failed(error_code) => {
                self.state = ProductState::Failed { error_code };
                tracing::warn!(product = ?self.product_id, error_code, "purchase failed");
                self.notify(|l, p| l.purchase_failed(p, error_code));
            }
        }
        Ok(())
    }

    fn handle_receipt_event(&mut self, handle: ProductHandle, outcome: &ReceiptOutcome) -> Result<()> {
        self.check_handle(handle)?;

        match outcome {
            ReceiptOutcome::Valid(receipt) => {
                if self.receipt.is_some() {
                    tracing::warn!(product = ?self.product_id, "rejecting second receipt");
                    return Err(PurchaseError::DuplicateReceipt(handle));
                }
                self.receipt = Some(receipt.clone());
                if matches!(self.state, ProductState::Created | ProductState::Purchasing) {
                    self.state = ProductState::Purchased;
                }
                tracing::info!(
                    product = ?self.product_id,
                    transaction = %receipt.transaction_id,
                    "receipt attached"
                );
                self.notify(|l, p| l.receipt_valid(p, receipt));
            }
            ReceiptOutcome::Invalid => {
                tracing::warn!(product = ?self.product_id, "receipt rejected by store");
                self.notify(|l, p| l.receipt_invalid(p));
            }
            ReceiptOutcome::Error(error_code) => {
                let error_code = *error_code;
                tracing::warn!(product = ?self.product_id, error_code, "receipt verification error");
                self.notify(|l, p| l.receipt_error(p, error_code));
            }
        }
        Ok(())
    }

    /// Events past creation must target the confirmed handle.
    fn check_handle(&self, handle: ProductHandle) -> Result<()> {
        match self.handle {
            Some(current) if current == handle => Ok(()),
            Some(current) => Err(PurchaseError::HandleMismatch {
                expected: current,
                actual: handle,
            }),
            None => Err(PurchaseError::state(format!(
                "event for unconfirmed product in state {}",
                self.state
            ))),
        }
    }

    fn notify(&self, mut call: impl FnMut(&dyn ProductListener, &Self)) {
        self.listeners.for_each_live(|listener| call(listener, self));
    }
}

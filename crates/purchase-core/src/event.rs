//! Platform purchase event records and their typed decoding.
//!
//! The platform delivers every purchase fact as one flat record whose
//! `event_type` tag selects how `state` and `error_code` are read.
//! [`PurchaseEvent::decode`] turns that record into a closed enum so the
//! rest of the crate never matches on raw integers.

use serde::{Deserialize, Serialize};

use crate::error::{PurchaseError, Result};
use crate::receipt::Receipt;
use crate::types::ProductHandle;

/// Event type tags.
pub mod event_type {
    /// The platform confirmed or rejected a product.
    pub const PRODUCT_CREATE: i32 = 1;
    /// A purchase request progressed.
    pub const REQUEST: i32 = 2;
    /// A receipt verification finished.
    pub const RECEIPT: i32 = 3;
    /// A previous transaction was restored.
    pub const RESTORE: i32 = 4;
    /// A previous transaction was refunded.
    pub const REFUND: i32 = 5;
}

/// Event state values.
pub mod state {
    /// The operation failed; see `error_code`.
    pub const FAILED: i32 = 0;
    /// The operation is in progress.
    pub const IN_PROGRESS: i32 = 1;
    /// The product identifier is known to the store.
    pub const PRODUCT_VALID: i32 = 2;
    /// The product identifier is unknown to the store.
    pub const PRODUCT_INVALID: i32 = 3;
    /// The operation completed.
    pub const COMPLETED: i32 = 4;
    /// The receipt was verified.
    pub const RECEIPT_VALID: i32 = 5;
    /// The store rejected the receipt.
    pub const RECEIPT_INVALID: i32 = 6;
    /// Receipt verification could not run.
    pub const RECEIPT_ERROR: i32 = 7;
}

/// Platform error codes carried in `error_code`.
pub mod error_code {
    /// No error.
    pub const NONE: i32 = 0;
    /// The product is not in the store catalog.
    pub const INVALID_PRODUCT: i32 = -2;
    /// The user cancelled the purchase.
    pub const CANCELLED: i32 = -4;
    /// The store refused payment.
    pub const PAYMENT_DECLINED: i32 = -5;
    /// No receipt exists for the product.
    pub const NO_RECEIPT: i32 = -10;
    /// The store could not be reached.
    pub const STORE_UNAVAILABLE: i32 = -11;
}

/// Raw purchase event record as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEventData {
    /// Event type tag (see [`event_type`]).
    pub event_type: i32,
    /// Event state (see [`state`]).
    pub state: i32,
    /// Raw handle of the product the event concerns.
    pub product_handle: i32,
    /// Platform error code (see [`error_code`]).
    #[serde(default)]
    pub error_code: i32,
    /// Receipt payload for receipt and restore events.
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

impl PurchaseEventData {
    /// Creates a record without error code or receipt.
    #[must_use]
    pub const fn new(event_type: i32, state: i32, handle: ProductHandle) -> Self {
        Self {
            event_type,
            state,
            product_handle: handle.raw(),
            error_code: error_code::NONE,
            receipt: None,
        }
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_error(mut self, code: i32) -> Self {
        self.error_code = code;
        self
    }

    /// Attaches a receipt payload.
    #[must_use]
    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    /// Returns the product handle the record concerns.
    #[must_use]
    pub const fn handle(&self) -> ProductHandle {
        ProductHandle::new(self.product_handle)
    }

    /// Record confirming a product.
    #[must_use]
    pub const fn product_valid(handle: ProductHandle) -> Self {
        Self::new(event_type::PRODUCT_CREATE, state::PRODUCT_VALID, handle)
    }

    /// Record rejecting a product.
    #[must_use]
    pub fn product_invalid(handle: ProductHandle) -> Self {
        Self::new(event_type::PRODUCT_CREATE, state::PRODUCT_INVALID, handle)
            .with_error(error_code::INVALID_PRODUCT)
    }

    /// Record of a purchase request in progress.
    #[must_use]
    pub const fn request_in_progress(handle: ProductHandle) -> Self {
        Self::new(event_type::REQUEST, state::IN_PROGRESS, handle)
    }

    /// Record of a completed purchase request.
    #[must_use]
    pub const fn request_completed(handle: ProductHandle) -> Self {
        Self::new(event_type::REQUEST, state::COMPLETED, handle)
    }

    /// Record of a failed purchase request.
    #[must_use]
    pub fn request_failed(handle: ProductHandle, code: i32) -> Self {
        Self::new(event_type::REQUEST, state::FAILED, handle).with_error(code)
    }

    /// Record of a verified receipt.
    #[must_use]
    pub fn receipt_valid(handle: ProductHandle, receipt: Receipt) -> Self {
        Self::new(event_type::RECEIPT, state::RECEIPT_VALID, handle).with_receipt(receipt)
    }

    /// Record of a rejected receipt.
    #[must_use]
    pub const fn receipt_invalid(handle: ProductHandle) -> Self {
        Self::new(event_type::RECEIPT, state::RECEIPT_INVALID, handle)
    }

    /// Record of a receipt verification error.
    #[must_use]
    pub fn receipt_error(handle: ProductHandle, code: i32) -> Self {
        Self::new(event_type::RECEIPT, state::RECEIPT_ERROR, handle).with_error(code)
    }

    /// Record of a restored transaction.
    #[must_use]
    pub fn restored(handle: ProductHandle, receipt: Option<Receipt>) -> Self {
        let mut data = Self::new(event_type::RESTORE, state::COMPLETED, handle);
        data.receipt = receipt;
        data
    }

    /// Record of a failed restore.
    #[must_use]
    pub fn restore_failed(code: i32) -> Self {
        Self::new(event_type::RESTORE, state::FAILED, ProductHandle::NONE).with_error(code)
    }

    /// Record of a refunded transaction.
    #[must_use]
    pub const fn refunded(handle: ProductHandle) -> Self {
        Self::new(event_type::REFUND, state::COMPLETED, handle)
    }
}

/// Progress of a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The store accepted the request and is processing it.
    InProgress,
    /// The purchase went through.
    Completed,
    /// The purchase failed with a platform error code.
    Failed(i32),
}

/// Result of a receipt verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// The receipt was verified.
    Valid(Receipt),
    /// The store rejected the receipt.
    Invalid,
    /// Verification could not run.
    Error(i32),
}

/// Typed purchase event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEvent {
    /// The platform confirmed (`valid`) or rejected a product.
    ProductCreate {
        /// Product handle.
        handle: ProductHandle,
        /// Whether the store knows the product.
        valid: bool,
    },
    /// A purchase request progressed.
    Request {
        /// Product handle.
        handle: ProductHandle,
        /// Request progress.
        outcome: RequestOutcome,
    },
    /// A receipt verification finished.
    Receipt {
        /// Product handle.
        handle: ProductHandle,
        /// Verification result.
        outcome: ReceiptOutcome,
    },
    /// A previous transaction was restored.
    Restore {
        /// Handle of the restored product, or [`ProductHandle::NONE`] on failure.
        handle: ProductHandle,
        /// `Ok` with the optional receipt, or the platform error code.
        outcome: std::result::Result<Option<Receipt>, i32>,
    },
    /// A previous transaction was refunded.
    Refund {
        /// Handle of the refunded product.
        handle: ProductHandle,
    },
}

impl PurchaseEvent {
    /// Decodes a raw platform record.
    ///
    /// # Errors
    /// Returns [`PurchaseError::UnknownEventType`] or
    /// [`PurchaseError::UnknownEventState`] for tags outside the known set,
    /// and [`PurchaseError::MissingReceipt`] for a valid receipt without
    /// payload.
    pub fn decode(data: &PurchaseEventData) -> Result<Self> {
        let handle = data.handle();
        let unknown_state = || PurchaseError::UnknownEventState {
            event_type: data.event_type,
            state: data.state,
        };

        match data.event_type {
            event_type::PRODUCT_CREATE => {
                let valid = match data.state {
                    state::PRODUCT_VALID => true,
                    state::PRODUCT_INVALID => false,
                    _ => return Err(unknown_state()),
                };
                Ok(Self::ProductCreate { handle, valid })
            }
            event_type::REQUEST => {
                let outcome = match data.state {
                    state::IN_PROGRESS => RequestOutcome::InProgress,
                    state::COMPLETED => RequestOutcome::Completed,
                    state::FAILED => RequestOutcome::Failed(data.error_code),
                    _ => return Err(unknown_state()),
                };
                Ok(Self::Request { handle, outcome })
            }
            event_type::RECEIPT => {
                let outcome = match data.state {
                    state::RECEIPT_VALID => {
                        let receipt = data
                            .receipt
                            .clone()
                            .ok_or(PurchaseError::MissingReceipt(handle))?;
                        ReceiptOutcome::Valid(receipt)
                    }
                    state::RECEIPT_INVALID => ReceiptOutcome::Invalid,
                    state::RECEIPT_ERROR => ReceiptOutcome::Error(data.error_code),
                    _ => return Err(unknown_state()),
                };
                Ok(Self::Receipt { handle, outcome })
            }
            event_type::RESTORE => {
                let outcome = match data.state {
                    state::COMPLETED => Ok(data.receipt.clone()),
                    state::FAILED => Err(data.error_code),
                    _ => return Err(unknown_state()),
                };
                Ok(Self::Restore { handle, outcome })
            }
            event_type::REFUND => match data.state {
                state::COMPLETED => Ok(Self::Refund { handle }),
                _ => Err(unknown_state()),
            },
            other => Err(PurchaseError::UnknownEventType(other)),
        }
    }

    /// Returns the product handle the event concerns.
    #[must_use]
    pub const fn handle(&self) -> ProductHandle {
        match self {
            Self::ProductCreate { handle, .. }
            | Self::Request { handle, .. }
            | Self::Receipt { handle, .. }
            | Self::Restore { handle, .. }
            | Self::Refund { handle } => *handle,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProductCreate { .. } => "product-create",
            Self::Request { .. } => "request",
            Self::Receipt { .. } => "receipt",
            Self::Restore { .. } => "restore",
            Self::Refund { .. } => "refund",
        }
    }
}

impl TryFrom<&PurchaseEventData> for PurchaseEvent {
    type Error = PurchaseError;

    fn try_from(data: &PurchaseEventData) -> Result<Self> {
        Self::decode(data)
    }
}


// Property-based tests for event.rs
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Tags outside the known event types never decode
        #[test]
        fn unknown_event_type_is_rejected(
            event_type in any::<i32>().prop_filter("known tag", |t| !(1..=5).contains(t)),
            state in any::<i32>(),
            raw in any::<i32>(),
        ) {
            let data = PurchaseEventData::new(event_type, state, ProductHandle::new(raw));
            let err = PurchaseEvent::decode(&data).unwrap_err();
            prop_assert!(matches!(err, PurchaseError::UnknownEventType(t) if t == event_type));
        }

        /// Every decode failure is classified as a malformed event
        #[test]
        fn decode_errors_are_malformed_events(event_type in 0i32..8, state in -2i32..10, raw in 0i32..100) {
            let data = PurchaseEventData::new(event_type, state, ProductHandle::new(raw));
            if let Err(err) = PurchaseEvent::decode(&data) {
                prop_assert!(err.is_malformed_event());
            }
        }
    }
}

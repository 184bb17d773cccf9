//! Error types for purchase-core.
//!
//! All failure modes are explicit; nothing in this crate panics on bad
//! platform input.

use crate::types::ProductHandle;

/// Result type alias for purchase operations.
pub type Result<T> = std::result::Result<T, PurchaseError>;

/// Errors raised while decoding platform events or driving products.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    /// The event record carries a type tag this crate does not know.
    #[error("unknown purchase event type: {0}")]
    UnknownEventType(i32),

    /// The event record carries a state that is not valid for its type.
    #[error("unknown state {state} for purchase event type {event_type}")]
    UnknownEventState {
        /// Event type tag.
        event_type: i32,
        /// Offending state value.
        state: i32,
    },

    /// A valid-receipt event arrived without a receipt payload.
    #[error("receipt event for product {0} carries no receipt")]
    MissingReceipt(ProductHandle),

    /// The event targets a different handle than the product owns.
    #[error("handle mismatch: product owns {expected}, event targets {actual}")]
    HandleMismatch {
        /// Handle held by the product.
        expected: ProductHandle,
        /// Handle carried by the event.
        actual: ProductHandle,
    },

    /// A second valid receipt arrived for a product that already has one.
    #[error("product {0} already holds a receipt")]
    DuplicateReceipt(ProductHandle),

    /// No product is registered under the handle.
    #[error("unknown product handle: {0}")]
    UnknownProduct(ProductHandle),

    /// The operation is not valid in the product's current state.
    #[error("invalid state: {0}")]
    State(String),

    /// The platform does not support purchases.
    #[error("purchasing is not supported on this platform")]
    NotSupported,

    /// The platform rejected a call.
    #[error("platform error: {0}")]
    Platform(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PurchaseError {
    /// Creates an invalid-state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Creates a platform error.
    #[must_use]
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the error came from a malformed event record.
    ///
    /// Such events are dropped; the product is left untouched.
    #[must_use]
    pub const fn is_malformed_event(&self) -> bool {
        matches!(
            self,
            Self::UnknownEventType(_) | Self::UnknownEventState { .. } | Self::MissingReceipt(_)
        )
    }
}

//! Core types for product lifecycle tracking.
//!
//! Explicit state machine, no implicit transitions.

use serde::{Deserialize, Serialize};

/// Opaque platform-assigned identifier for a purchase object.
///
/// Meaningless outside the platform; `0` is the unset value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductHandle(i32);

impl ProductHandle {
    /// The unset handle.
    pub const NONE: Self = Self(0);

    /// Wraps a raw platform handle.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw platform value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns true for the unset handle.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ProductHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product lifecycle state.
///
/// ```text
/// Pending → Created → Purchasing → Purchased
///    ↓                    ↓
/// Invalid              Failed ──→ Purchasing (retry)
///
/// Restored / Refunded: products rebuilt from a platform handle.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductState {
    /// Created by the caller, not yet confirmed by the platform.
    Pending,
    /// The platform rejected the product identifier.
    Invalid,
    /// The platform confirmed the product and assigned its handle.
    Created,
    /// A purchase request is in progress.
    Purchasing,
    /// The purchase completed.
    Purchased,
    /// The last purchase request failed.
    Failed {
        /// Platform error code.
        error_code: i32,
    },
    /// Rebuilt from a restored transaction.
    Restored,
    /// Rebuilt from a refunded transaction.
    Refunded,
}

impl ProductState {
    /// Returns true if the platform has confirmed the product.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        !matches!(self, Self::Pending | Self::Invalid)
    }

    /// Returns true if a purchase request may be issued in this state.
    #[must_use]
    pub const fn can_purchase(&self) -> bool {
        matches!(self, Self::Created | Self::Failed { .. } | Self::Purchased)
    }

    /// Returns true if the product owns a completed transaction.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Purchased | Self::Restored)
    }
}

impl std::fmt::Display for ProductState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Invalid => f.write_str("invalid"),
            Self::Created => f.write_str("created"),
            Self::Purchasing => f.write_str("purchasing"),
            Self::Purchased => f.write_str("purchased"),
            Self::Failed { error_code } => write!(f, "failed ({error_code})"),
            Self::Restored => f.write_str("restored"),
            Self::Refunded => f.write_str("refunded"),
        }
    }
}

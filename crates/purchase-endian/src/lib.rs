// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # purchase-endian
//!
//! Compile-time byte order selection.
//!
//! The byte order is resolved from two Cargo features, mirroring the
//! IEEE little-endian build flags:
//!
//! | `ieee-little-endian` | `ieee-bytes-little-endian` | [`BYTE_ORDER`] |
//! |----------------------|----------------------------|----------------|
//! | off | off | [`BIG_ENDIAN`] |
//! | on  | any | [`LITTLE_ENDIAN`] |
//! | any | on  | [`LITTLE_ENDIAN`] |
//!
//! ## Example
//!
//! ```rust
//! use purchase_endian::{ByteOrder, BYTE_ORDER, BIG_ENDIAN, LITTLE_ENDIAN};
//!
//! assert!(BYTE_ORDER == BIG_ENDIAN || BYTE_ORDER == LITTLE_ENDIAN);
//!
//! let order = ByteOrder::configured();
//! let bytes = order.u32_to_bytes(0x1234_5678);
//! assert_eq!(order.u32_from_bytes(bytes), 0x1234_5678);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod order;

pub use order::ByteOrder;

/// Tag for big-endian (most significant byte first) layout.
pub const BIG_ENDIAN: u32 = 4321;

/// Tag for little-endian (least significant byte first) layout.
pub const LITTLE_ENDIAN: u32 = 1234;

/// Byte order selected for this build.
pub const BYTE_ORDER: u32 = ByteOrder::configured().tag();

/// Aliases under the reserved C names.
#[allow(non_upper_case_globals)]
pub mod compat {
    /// Alias of [`crate::BIG_ENDIAN`].
    pub const __BIG_ENDIAN: u32 = crate::BIG_ENDIAN;
    /// Alias of [`crate::LITTLE_ENDIAN`].
    pub const __LITTLE_ENDIAN: u32 = crate::LITTLE_ENDIAN;
    /// Alias of [`crate::BYTE_ORDER`].
    pub const __BYTE_ORDER: u32 = crate::BYTE_ORDER;
}

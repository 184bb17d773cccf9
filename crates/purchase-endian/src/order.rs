//! The [`ByteOrder`] selector and byte-order aware integer codecs.

use core::fmt;

use crate::{BIG_ENDIAN, LITTLE_ENDIAN};

/// Byte order of multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    /// Resolves the order from the two IEEE little-endian flags.
    ///
    /// Either flag selects [`ByteOrder::Little`]. With neither set the
    /// order defaults to [`ByteOrder::Big`].
    #[must_use]
    pub const fn from_flags(ieee_little_endian: bool, ieee_bytes_little_endian: bool) -> Self {
        if ieee_little_endian || ieee_bytes_little_endian {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// Order selected by this build's Cargo features.
    #[must_use]
    pub const fn configured() -> Self {
        Self::from_flags(
            cfg!(feature = "ieee-little-endian"),
            cfg!(feature = "ieee-bytes-little-endian"),
        )
    }

    /// Order of the compilation target.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// Returns true if the configured order is the target's real order.
    ///
    /// A mismatch means the features were set for a different machine.
    #[must_use]
    pub const fn matches_target() -> bool {
        matches!(
            (Self::configured(), Self::native()),
            (Self::Big, Self::Big) | (Self::Little, Self::Little)
        )
    }

    /// Returns the integer tag ([`BIG_ENDIAN`] or [`LITTLE_ENDIAN`]).
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Big => BIG_ENDIAN,
            Self::Little => LITTLE_ENDIAN,
        }
    }

    /// Maps an integer tag back to an order.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            BIG_ENDIAN => Some(Self::Big),
            LITTLE_ENDIAN => Some(Self::Little),
            _ => None,
        }
    }

    /// Encodes a `u16` in this order.
    #[must_use]
    pub const fn u16_to_bytes(self, value: u16) -> [u8; 2] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u16` stored in this order.
    #[must_use]
    pub const fn u16_from_bytes(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Big => u16::from_be_bytes(bytes),
            Self::Little => u16::from_le_bytes(bytes),
        }
    }

    /// Encodes a `u32` in this order.
    #[must_use]
    pub const fn u32_to_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u32` stored in this order.
    #[must_use]
    pub const fn u32_from_bytes(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    /// Encodes a `u64` in this order.
    #[must_use]
    pub const fn u64_to_bytes(self, value: u64) -> [u8; 8] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Decodes a `u64` stored in this order.
    #[must_use]
    pub const fn u64_from_bytes(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Big => u64::from_be_bytes(bytes),
            Self::Little => u64::from_le_bytes(bytes),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::configured()
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Big => f.write_str("big-endian"),
            Self::Little => f.write_str("little-endian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_flags_defaults_to_big() {
        assert_eq!(ByteOrder::from_flags(false, false), ByteOrder::Big);
    }

    #[test]
    fn test_from_flags_either_flag_selects_little() {
        assert_eq!(ByteOrder::from_flags(true, false), ByteOrder::Little);
        assert_eq!(ByteOrder::from_flags(false, true), ByteOrder::Little);
        assert_eq!(ByteOrder::from_flags(true, true), ByteOrder::Little);
    }

    #[test]
    fn test_tag_mapping() {
        assert_eq!(ByteOrder::Big.tag(), 4321);
        assert_eq!(ByteOrder::Little.tag(), 1234);
        assert_eq!(ByteOrder::from_tag(4321), Some(ByteOrder::Big));
        assert_eq!(ByteOrder::from_tag(1234), Some(ByteOrder::Little));
        assert_eq!(ByteOrder::from_tag(0), None);
    }

    #[test]
    fn test_native_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(ByteOrder::native(), expected);
    }

    #[test]
    fn test_matches_target_consistent() {
        assert_eq!(
            ByteOrder::matches_target(),
            ByteOrder::configured() == ByteOrder::native()
        );
    }

    #[test]
    fn test_u32_layout() {
        assert_eq!(ByteOrder::Big.u32_to_bytes(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(ByteOrder::Little.u32_to_bytes(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_u16_layout() {
        assert_eq!(ByteOrder::Big.u16_from_bytes([0x4D, 0x4D]), 0x4D4D);
        assert_eq!(ByteOrder::Little.u16_from_bytes([0x34, 0x12]), 0x1234);
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteOrder::Big.to_string(), "big-endian");
        assert_eq!(ByteOrder::Little.to_string(), "little-endian");
    }

    proptest! {
        #[test]
        fn prop_opposite_orders_reverse_bytes(value in any::<u64>()) {
            let mut big = ByteOrder::Big.u64_to_bytes(value);
            big.reverse();
            prop_assert_eq!(big, ByteOrder::Little.u64_to_bytes(value));
        }

        #[test]
        fn prop_decode_inverts_encode(value in any::<u32>(), little in any::<bool>()) {
            let order = ByteOrder::from_flags(little, false);
            prop_assert_eq!(order.u32_from_bytes(order.u32_to_bytes(value)), value);
        }
    }
}

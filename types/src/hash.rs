//! Fixed-size opaque hash types used across the anchoring and keystore layers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! hash32 {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), hex(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex(&self.0))
            }
        }
    };
}

hash32! {
    /// Identifier of an anchor slot on chain. Must not be zero when used.
    AnchorId
}

hash32! {
    /// Hash of a document state committed against an anchor.
    DocumentRoot
}

hash32! {
    /// Hash slot of a registered key. For Ed25519 keys this is the raw
    /// 32-byte public key.
    KeyHash
}

hash32! {
    /// Hash of a chain block.
    BlockHash
}

hash32! {
    /// Hash of a submitted extrinsic.
    TxHash
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_zero() {
        assert!(AnchorId::ZERO.is_zero());
        assert!(!AnchorId::new([1u8; 32]).is_zero());
    }

    #[test]
    fn display_is_full_hex() {
        let id = DocumentRoot::new([0xab; 32]);
        assert_eq!(id.to_string(), "ab".repeat(32));
    }

    #[test]
    fn debug_is_short_hex() {
        let id = KeyHash::new([0x01; 32]);
        assert_eq!(format!("{:?}", id), "KeyHash(01010101)");
    }
}

//! Fundamental types for the Mooring node.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: chain identities, anchor and key hashes, key records, proxy
//! definitions, timestamps, and signing key material.

pub mod hash;
pub mod identity;
pub mod keys;
pub mod proxy;
pub mod signing;
pub mod time;

pub use hash::{AnchorId, BlockHash, DocumentRoot, KeyHash, TxHash};
pub use identity::{AccountId, ProtocolId};
pub use keys::{AddKey, KeyId, KeyPurpose, KeyRecord, KeyType};
pub use proxy::{ProxyDefinition, ProxyStorageEntry, ProxyType};
pub use signing::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;

/// A chain block height.
pub type BlockNumber = u64;

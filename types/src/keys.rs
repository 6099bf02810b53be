//! Keystore record types.
//!
//! Each identity owns a set of versioned key records on chain, namespaced by
//! purpose so that a discovery key and a document-signing key with the same
//! hash never collide.

use crate::hash::KeyHash;
use crate::BlockNumber;
use serde::{Deserialize, Serialize};

/// The protocol role a registered key is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPurpose {
    /// Peer discovery.
    Discovery,
    /// Document signing.
    DocumentSigning,
}

/// The cryptographic scheme of a registered key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Ed25519,
    Ecdsa,
}

/// Unique key slot per identity: (key hash, key purpose).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId {
    pub hash: KeyHash,
    pub purpose: KeyPurpose,
}

impl KeyId {
    pub fn new(hash: KeyHash, purpose: KeyPurpose) -> Self {
        Self { hash, purpose }
    }
}

/// A key registration request, one element of an `add_keys` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddKey {
    pub key: KeyHash,
    pub purpose: KeyPurpose,
    pub key_type: KeyType,
}

/// A versioned key record stored on chain.
///
/// `revoked_at == None` means the key is valid indefinitely from its
/// registration. `Some(n)` means the key is valid only strictly before block
/// height `n`. Revocation is monotonic: the field is set once and never
/// cleared, and records are never deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key_type: KeyType,
    pub purpose: KeyPurpose,
    pub deposit: u128,
    pub revoked_at: Option<BlockNumber>,
}

impl KeyRecord {
    /// Whether the record has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

//! Extrinsic signing identities.

use mooring_crypto::sign_message;
use mooring_types::{AccountId, KeyPair, PublicKey, Signature};
use std::sync::Arc;

/// A signing identity for extrinsic submission: a chain account plus the
/// key pair that signs on its behalf.
///
/// Cloning shares the underlying key material; the private key itself is
/// never copied.
#[derive(Clone)]
pub struct Keyring {
    account_id: AccountId,
    keypair: Arc<KeyPair>,
}

impl Keyring {
    pub fn new(account_id: AccountId, keypair: Arc<KeyPair>) -> Self {
        Self {
            account_id,
            keypair,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        sign_message(message, &self.keypair.private)
    }
}

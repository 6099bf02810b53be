//! Account entity and storage trait.

use crate::StoreError;
use mooring_chain::Keyring;
use mooring_crypto::sign_message;
use mooring_types::{AccountId, KeyPair, PrivateKey, PublicKey, Signature};
use std::sync::Arc;

/// A local account bound to a chain identity.
///
/// Binds the identity to its document-signing key pair, webhook delivery
/// URL, and feature flags. Created once by provisioning; immutable
/// afterwards.
pub struct Account {
    identity: AccountId,
    signing_key: Arc<KeyPair>,
    webhook_url: Option<String>,
    precommit_enabled: bool,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("identity", &self.identity)
            .field("signing_key", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("precommit_enabled", &self.precommit_enabled)
            .finish()
    }
}

impl Clone for Account {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            signing_key: Arc::clone(&self.signing_key),
            webhook_url: self.webhook_url.clone(),
            precommit_enabled: self.precommit_enabled,
        }
    }
}

impl Account {
    pub fn new(
        identity: AccountId,
        signing_key: KeyPair,
        webhook_url: Option<String>,
        precommit_enabled: bool,
    ) -> Self {
        Self {
            identity,
            signing_key: Arc::new(signing_key),
            webhook_url,
            precommit_enabled,
        }
    }

    pub fn identity(&self) -> &AccountId {
        &self.identity
    }

    pub fn signing_public_key(&self) -> &PublicKey {
        &self.signing_key.public
    }

    /// Sign a document payload with the account's signing key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        sign_message(message, &self.signing_key.private)
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    pub fn precommit_enabled(&self) -> bool {
        self.precommit_enabled
    }

    pub(crate) fn signing_private(&self) -> &PrivateKey {
        &self.signing_key.private
    }
}

/// The service's own chain account: the universal executing signer for
/// proxy-delegated calls.
pub struct PodOperator {
    account_id: AccountId,
    keypair: Arc<KeyPair>,
}

impl Clone for PodOperator {
    fn clone(&self) -> Self {
        Self {
            account_id: self.account_id,
            keypair: Arc::clone(&self.keypair),
        }
    }
}

impl PodOperator {
    pub fn new(account_id: AccountId, keypair: KeyPair) -> Self {
        Self {
            account_id,
            keypair: Arc::new(keypair),
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    /// The keyring that signs extrinsics on the operator's behalf.
    pub fn to_keyring(&self) -> Keyring {
        Keyring::new(self.account_id, Arc::clone(&self.keypair))
    }
}

/// Trait for account storage operations.
///
/// `create_account` enforces identity uniqueness; it is the only protection
/// against concurrent provisioning of the same identity.
pub trait AccountStore: Send + Sync {
    fn create_account(&self, account: &Account) -> Result<(), StoreError>;
    fn account(&self, identity: &AccountId) -> Result<Account, StoreError>;
    fn accounts(&self) -> Result<Vec<Account>, StoreError>;
    fn pod_operator(&self) -> Result<PodOperator, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_crypto::{generate_keypair, verify_signature};

    #[test]
    fn account_signs_with_its_key() {
        let keypair = generate_keypair();
        let public = keypair.public.clone();
        let account = Account::new(AccountId::new([1u8; 32]), keypair, None, false);

        let sig = account.sign(b"payload");
        assert!(verify_signature(b"payload", &sig, &public));
    }

    #[test]
    fn pod_operator_keyring_matches_account() {
        let operator = PodOperator::new(AccountId::new([2u8; 32]), generate_keypair());
        let keyring = operator.to_keyring();
        assert_eq!(keyring.account_id(), operator.account_id());
        assert_eq!(keyring.public_key(), operator.public_key());
    }
}

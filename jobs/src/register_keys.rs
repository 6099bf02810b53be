//! Out-of-band key registration.
//!
//! Provisioning an account cannot register its keys inline: registration
//! runs through the identity's keystore-management proxy, and that
//! relationship may not exist yet when the account is created. This task is
//! queued instead — it filters out keys already on chain, waits for the pod
//! operator to become a delegate of the identity, then submits one
//! `add_keys` for the rest.

use crate::retry;
use mooring_chain::{ChainClient, ExtrinsicInfo};
use mooring_pallets::keystore::KeystoreError;
use mooring_pallets::{KeystoreRegistry, ProxyDelegate, ProxyError};
use mooring_store::Account;
use mooring_types::{AccountId, AddKey, KeyHash, KeyId, KeyPurpose, KeyType, ProxyType, PublicKey};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterKeysError {
    #[error("couldn't look up existing keys")]
    KeyLookup,

    #[error("pod operator never became a keystore-management delegate")]
    ProxyNotReady,

    #[error("couldn't register keys")]
    AddKeys,
}

/// The queued key-registration task.
pub struct RegisterKeys<C> {
    keystore: KeystoreRegistry<C>,
    proxy: ProxyDelegate<C>,
    pod_operator: AccountId,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<C: ChainClient> RegisterKeys<C> {
    pub fn new(
        keystore: KeystoreRegistry<C>,
        proxy: ProxyDelegate<C>,
        pod_operator: AccountId,
    ) -> Self {
        Self {
            keystore,
            proxy,
            pod_operator,
            poll_interval: Duration::from_secs(6),
            max_attempts: 10,
        }
    }

    /// Override the proxy-polling cadence.
    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Register the account's discovery and document-signing keys that are
    /// not yet on chain. Returns `None` when everything was already
    /// registered.
    pub async fn run(
        &self,
        account: &Account,
        discovery_key: &PublicKey,
    ) -> Result<Option<ExtrinsicInfo>, RegisterKeysError> {
        let identity = *account.identity();

        let candidates = [
            KeyId::new(KeyHash::new(*discovery_key.as_bytes()), KeyPurpose::Discovery),
            KeyId::new(
                KeyHash::new(*account.signing_public_key().as_bytes()),
                KeyPurpose::DocumentSigning,
            ),
        ];

        let mut unstored = Vec::new();
        for key_id in candidates {
            match self.keystore.key(&identity, &key_id).await {
                Ok(_) => {}
                Err(KeystoreError::KeyNotFound) => unstored.push(key_id),
                Err(e) => {
                    tracing::error!(error = %e, identity = %identity, "couldn't look up key");
                    return Err(RegisterKeysError::KeyLookup);
                }
            }
        }

        if unstored.is_empty() {
            tracing::debug!(identity = %identity, "all keys already registered");
            return Ok(None);
        }

        self.wait_for_proxy(&identity).await?;

        let keys: Vec<AddKey> = unstored
            .into_iter()
            .map(|key_id| AddKey {
                key: key_id.hash,
                purpose: key_id.purpose,
                key_type: KeyType::Ed25519,
            })
            .collect();

        let info = self
            .keystore
            .add_keys(&identity, &keys)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, identity = %identity, "couldn't register keys");
                RegisterKeysError::AddKeys
            })?;

        Ok(Some(info))
    }

    async fn wait_for_proxy(&self, identity: &AccountId) -> Result<(), RegisterKeysError> {
        retry::bounded(self.poll_interval, self.max_attempts, || async {
            match self.proxy.proxies(identity).await {
                Ok(entry)
                    if entry.delegates_to(&self.pod_operator, ProxyType::KeystoreManagement) =>
                {
                    Ok(())
                }
                Ok(_) => Err(RegisterKeysError::ProxyNotReady),
                Err(ProxyError::ProxiesNotFound) => Err(RegisterKeysError::ProxyNotReady),
                Err(e) => {
                    tracing::warn!(error = %e, identity = %identity, "proxy lookup failed, will retry");
                    Err(RegisterKeysError::ProxyNotReady)
                }
            }
        })
        .await
    }
}

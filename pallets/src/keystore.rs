//! On-chain key registry via the `Keystore` pallet.
//!
//! Key records are namespaced per identity by (hash, purpose), so a
//! discovery key and a document-signing key with the same hash occupy
//! different slots. A secondary index tracks the last key registered per
//! purpose, avoiding history enumeration.

use crate::proxy::ProxyDelegate;
use mooring_chain::{codec, create_storage_key, Call, ChainClient, ExtrinsicInfo, Keyring};
use mooring_types::{AccountId, AddKey, KeyHash, KeyId, KeyPurpose, KeyRecord, ProxyType};
use std::sync::Arc;
use thiserror::Error;

pub const PALLET_NAME: &str = "Keystore";

pub const ADD_KEYS_CALL: &str = "Keystore.add_keys";
pub const REVOKE_KEYS_CALL: &str = "Keystore.revoke_keys";

pub const KEYS_STORAGE: &str = "Keys";
pub const LAST_KEY_BY_PURPOSE_STORAGE: &str = "LastKeyByPurpose";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeystoreError {
    #[error("invalid identity")]
    InvalidIdentity,

    #[error("no keys provided")]
    EmptyKeys,

    #[error("key hash is zero")]
    ZeroKeyHash,

    #[error("couldn't retrieve metadata")]
    MetadataRetrieval,

    #[error("couldn't encode key ID")]
    KeyIdEncoding,

    #[error("couldn't encode identity")]
    IdentityEncoding,

    #[error("couldn't encode key purpose")]
    KeyPurposeEncoding,

    #[error("couldn't create call")]
    CallCreation,

    #[error("couldn't create storage key")]
    StorageKeyCreation,

    #[error("couldn't retrieve key from storage")]
    KeyStorageRetrieval,

    #[error("key not found")]
    KeyNotFound,

    #[error("last key by purpose not found")]
    LastKeyByPurposeNotFound,

    #[error("couldn't perform proxy call")]
    ProxyCall,
}

/// Chain-backed registry of per-identity key records.
pub struct KeystoreRegistry<C> {
    chain: Arc<C>,
    proxy: ProxyDelegate<C>,
    pod_operator: Keyring,
}

impl<C> Clone for KeystoreRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            proxy: self.proxy.clone(),
            pod_operator: self.pod_operator.clone(),
        }
    }
}

impl<C: ChainClient> KeystoreRegistry<C> {
    pub fn new(chain: Arc<C>, proxy: ProxyDelegate<C>, pod_operator: Keyring) -> Self {
        Self {
            chain,
            proxy,
            pod_operator,
        }
    }

    /// Register keys for `identity` via its keystore-management proxy.
    ///
    /// Input is validated before any network call: the collection must be
    /// non-empty and contain no zero hash.
    pub async fn add_keys(
        &self,
        identity: &AccountId,
        keys: &[AddKey],
    ) -> Result<ExtrinsicInfo, KeystoreError> {
        if identity.is_zero() {
            return Err(KeystoreError::InvalidIdentity);
        }
        if keys.is_empty() {
            return Err(KeystoreError::EmptyKeys);
        }
        if keys.iter().any(|k| k.key.is_zero()) {
            return Err(KeystoreError::ZeroKeyHash);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            KeystoreError::MetadataRetrieval
        })?;

        let call = Call::new(&meta, ADD_KEYS_CALL, &(keys.to_vec(),)).map_err(|e| {
            tracing::error!(error = %e, "couldn't create add_keys call");
            KeystoreError::CallCreation
        })?;

        self.proxy
            .proxy_call(
                identity,
                &self.pod_operator,
                Some(ProxyType::KeystoreManagement),
                call,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, identity = %identity, "couldn't perform proxy call");
                KeystoreError::ProxyCall
            })
    }

    /// Revoke keys of one purpose for `identity`. Validation mirrors
    /// `add_keys`.
    pub async fn revoke_keys(
        &self,
        identity: &AccountId,
        key_hashes: &[KeyHash],
        purpose: KeyPurpose,
    ) -> Result<ExtrinsicInfo, KeystoreError> {
        if identity.is_zero() {
            return Err(KeystoreError::InvalidIdentity);
        }
        if key_hashes.is_empty() {
            return Err(KeystoreError::EmptyKeys);
        }
        if key_hashes.iter().any(|k| k.is_zero()) {
            return Err(KeystoreError::ZeroKeyHash);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            KeystoreError::MetadataRetrieval
        })?;

        let call = Call::new(&meta, REVOKE_KEYS_CALL, &(key_hashes.to_vec(), purpose)).map_err(
            |e| {
                tracing::error!(error = %e, "couldn't create revoke_keys call");
                KeystoreError::CallCreation
            },
        )?;

        self.proxy
            .proxy_call(
                identity,
                &self.pod_operator,
                Some(ProxyType::KeystoreManagement),
                call,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, identity = %identity, "couldn't perform proxy call");
                KeystoreError::ProxyCall
            })
    }

    /// Look up one key record. Absence is `KeyNotFound`, never a
    /// zero-valued record.
    pub async fn key(
        &self,
        identity: &AccountId,
        key_id: &KeyId,
    ) -> Result<KeyRecord, KeystoreError> {
        if identity.is_zero() {
            return Err(KeystoreError::InvalidIdentity);
        }
        if key_id.hash.is_zero() {
            return Err(KeystoreError::ZeroKeyHash);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            KeystoreError::MetadataRetrieval
        })?;

        let encoded_identity = codec::encode(identity).map_err(|e| {
            tracing::error!(error = %e, "couldn't encode identity");
            KeystoreError::IdentityEncoding
        })?;

        let encoded_key_id = codec::encode(key_id).map_err(|e| {
            tracing::error!(error = %e, "couldn't encode key ID");
            KeystoreError::KeyIdEncoding
        })?;

        let storage_key = create_storage_key(
            &meta,
            PALLET_NAME,
            KEYS_STORAGE,
            &[&encoded_identity, &encoded_key_id],
        )
        .map_err(|e| {
            tracing::error!(error = %e, "couldn't create storage key");
            KeystoreError::StorageKeyCreation
        })?;

        let bytes = self
            .chain
            .storage_latest(&storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't retrieve key from storage");
                KeystoreError::KeyStorageRetrieval
            })?
            .ok_or(KeystoreError::KeyNotFound)?;

        codec::decode(&bytes).map_err(|e| {
            tracing::error!(error = %e, "couldn't decode key record");
            KeystoreError::KeyStorageRetrieval
        })
    }

    /// The hash of the most recently registered key of one purpose.
    pub async fn last_key_by_purpose(
        &self,
        identity: &AccountId,
        purpose: KeyPurpose,
    ) -> Result<KeyHash, KeystoreError> {
        if identity.is_zero() {
            return Err(KeystoreError::InvalidIdentity);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            KeystoreError::MetadataRetrieval
        })?;

        let encoded_identity = codec::encode(identity).map_err(|e| {
            tracing::error!(error = %e, "couldn't encode identity");
            KeystoreError::IdentityEncoding
        })?;

        let encoded_purpose = codec::encode(&purpose).map_err(|e| {
            tracing::error!(error = %e, "couldn't encode key purpose");
            KeystoreError::KeyPurposeEncoding
        })?;

        let storage_key = create_storage_key(
            &meta,
            PALLET_NAME,
            LAST_KEY_BY_PURPOSE_STORAGE,
            &[&encoded_identity, &encoded_purpose],
        )
        .map_err(|e| {
            tracing::error!(error = %e, "couldn't create storage key");
            KeystoreError::StorageKeyCreation
        })?;

        let bytes = self
            .chain
            .storage_latest(&storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't retrieve key from storage");
                KeystoreError::KeyStorageRetrieval
            })?
            .ok_or(KeystoreError::LastKeyByPurposeNotFound)?;

        codec::decode(&bytes).map_err(|e| {
            tracing::error!(error = %e, "couldn't decode key hash");
            KeystoreError::KeyStorageRetrieval
        })
    }
}

//! As-of-time validation of keys, signatures, and accounts.

use crate::error::IdentityError;
use mooring_chain::{block_timestamp, codec, create_storage_key, ChainClient};
use mooring_crypto::verify_signature;
use mooring_pallets::keystore::KeystoreError;
use mooring_pallets::{KeystoreRegistry, ProxyDelegate, ProxyError};
use mooring_types::{
    AccountId, KeyHash, KeyId, KeyPurpose, KeyRecord, PublicKey, Signature, Timestamp,
};
use std::sync::Arc;

const SYSTEM_PALLET: &str = "System";
const ACCOUNT_STORAGE: &str = "Account";

/// Answers trust questions by correlating keystore records, proxy
/// relationships, and block timestamps.
pub struct IdentityValidator<C> {
    chain: Arc<C>,
    keystore: KeystoreRegistry<C>,
    proxy: ProxyDelegate<C>,
}

impl<C> Clone for IdentityValidator<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            keystore: self.keystore.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl<C: ChainClient> IdentityValidator<C> {
    pub fn new(chain: Arc<C>, keystore: KeystoreRegistry<C>, proxy: ProxyDelegate<C>) -> Self {
        Self {
            chain,
            keystore,
            proxy,
        }
    }

    /// Was `public_key` a valid key of `identity` for `purpose` as of
    /// `as_of`?
    ///
    /// A key with no revocation is valid indefinitely from registration. A
    /// revoked key is valid for all moments strictly before the wall-clock
    /// time of its revocation block, so signatures produced before
    /// revocation verify even when validated afterwards.
    pub async fn validate_key(
        &self,
        identity: &AccountId,
        public_key: &[u8],
        purpose: KeyPurpose,
        as_of: Timestamp,
    ) -> Result<(), IdentityError> {
        if identity.is_zero() {
            return Err(IdentityError::InvalidAccountId);
        }

        let key_bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| IdentityError::InvalidPublicKey)?;

        let key_id = KeyId::new(KeyHash::new(key_bytes), purpose);

        let record = match self.keystore.key(identity, &key_id).await {
            Ok(record) => record,
            Err(KeystoreError::KeyNotFound) => return Err(IdentityError::KeyNotFound),
            Err(e) => {
                tracing::error!(error = %e, identity = %identity, "couldn't retrieve key");
                return Err(IdentityError::KeyRetrieval);
            }
        };

        self.check_revocation(&record, as_of).await
    }

    async fn check_revocation(
        &self,
        record: &KeyRecord,
        as_of: Timestamp,
    ) -> Result<(), IdentityError> {
        let Some(revoked_at) = record.revoked_at else {
            return Ok(());
        };

        let block_hash = self.chain.block_hash(revoked_at).await.map_err(|e| {
            tracing::error!(error = %e, block = revoked_at, "couldn't retrieve block hash");
            IdentityError::BlockHashRetrieval
        })?;

        let block = self.chain.block(&block_hash).await.map_err(|e| {
            tracing::error!(error = %e, block = revoked_at, "couldn't retrieve block");
            IdentityError::BlockRetrieval
        })?;

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            IdentityError::MetadataRetrieval
        })?;

        let revocation_time =
            block_timestamp(&meta, &block).ok_or(IdentityError::BlockTimestampRetrieval)?;

        if as_of < revocation_time {
            Ok(())
        } else {
            tracing::debug!(%as_of, %revocation_time, "key is revoked");
            Err(IdentityError::KeyRevoked)
        }
    }

    /// Did `public_key` produce `signature` over `message`, and was it a
    /// valid document-signing key of `identity` as of `as_of`?
    ///
    /// Key validity is checked first so an invalid key fails fast without
    /// spending a verification cycle.
    pub async fn validate_signature(
        &self,
        identity: &AccountId,
        public_key: &[u8],
        message: &[u8],
        signature: &Signature,
        as_of: Timestamp,
    ) -> Result<(), IdentityError> {
        self.validate_key(identity, public_key, KeyPurpose::DocumentSigning, as_of)
            .await?;

        let key_bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| IdentityError::InvalidPublicKey)?;

        if !verify_signature(message, signature, &PublicKey(key_bytes)) {
            tracing::debug!(identity = %identity, "signature does not verify");
            return Err(IdentityError::InvalidSignature);
        }

        Ok(())
    }

    /// Is `account` a valid chain account?
    ///
    /// Many operational identities are never funded directly; they act only
    /// as delegates of a funded anonymous-proxy account. An account is
    /// therefore valid when it is directly present in system storage, or
    /// when it is absent there but reachable as a delegate with the
    /// universal capability.
    pub async fn validate_account(&self, account: &AccountId) -> Result<(), IdentityError> {
        if account.is_zero() {
            return Err(IdentityError::InvalidAccountId);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            IdentityError::MetadataRetrieval
        })?;

        let encoded_account = codec::encode(account)
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't encode account ID");
                IdentityError::AccountStorageKeyCreation
            })?;

        let storage_key = create_storage_key(&meta, SYSTEM_PALLET, ACCOUNT_STORAGE, &[&encoded_account])
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't create account storage key");
                IdentityError::AccountStorageKeyCreation
            })?;

        let present = self.chain.storage_latest(&storage_key).await.map_err(|e| {
            tracing::error!(error = %e, account = %account, "couldn't retrieve account from storage");
            IdentityError::AccountStorageRetrieval
        })?;

        if present.is_some() {
            return Ok(());
        }

        // Not directly funded: check whether the account is reachable as an
        // anonymous-proxy delegate.
        self.account_has_any_proxy(account).await
    }

    async fn account_has_any_proxy(&self, account: &AccountId) -> Result<(), IdentityError> {
        match self.proxy.proxies(account).await {
            Ok(entry) if entry.has_any_capability() => Ok(()),
            Ok(_) => {
                tracing::debug!(account = %account, "proxies exist but none carry Any");
                Err(IdentityError::AccountNotAnonymousProxy)
            }
            Err(ProxyError::ProxiesNotFound) => Err(IdentityError::InvalidAccount),
            Err(e) => {
                tracing::error!(error = %e, account = %account, "couldn't retrieve account proxies");
                Err(IdentityError::AccountProxiesRetrieval)
            }
        }
    }
}

//! Delegated-authority calls via the `Proxy` pallet.
//!
//! A proxy relationship authorizes one account to act for another, optionally
//! restricted to a single capability. `proxy_call` is the only path for
//! mutating chain state on behalf of an identity.

use mooring_chain::{codec, create_storage_key, Call, ChainClient, ExtrinsicInfo, Keyring};
use mooring_types::{AccountId, ProxyStorageEntry, ProxyType};
use std::sync::Arc;
use thiserror::Error;

pub const PALLET_NAME: &str = "Proxy";

pub const PROXY_CALL: &str = "Proxy.proxy";
pub const ADD_PROXY_CALL: &str = "Proxy.add_proxy";

pub const PROXIES_STORAGE: &str = "Proxies";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("invalid account ID")]
    InvalidAccount,

    #[error("couldn't retrieve metadata")]
    MetadataRetrieval,

    #[error("couldn't encode account ID")]
    AccountIdEncoding,

    #[error("couldn't create call")]
    CallCreation,

    #[error("couldn't create storage key")]
    StorageKeyCreation,

    #[error("couldn't submit extrinsic")]
    ExtrinsicSubmission,

    #[error("couldn't submit and watch extrinsic")]
    SubmitAndWatch,

    #[error("couldn't retrieve proxy storage entry")]
    ProxyStorageRetrieval,

    #[error("account proxies not found")]
    ProxiesNotFound,
}

/// Executes calls on behalf of identities through their registered proxy
/// relationships.
pub struct ProxyDelegate<C> {
    chain: Arc<C>,
}

impl<C> Clone for ProxyDelegate<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
        }
    }
}

impl<C: ChainClient> ProxyDelegate<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Execute `inner` as `delegator` through the proxy relationship held by
    /// the keyring's account, watching until inclusion.
    ///
    /// `forced_proxy_type` restricts which relationship may authorize the
    /// call; `None` accepts any registered capability.
    pub async fn proxy_call(
        &self,
        delegator: &AccountId,
        keyring: &Keyring,
        forced_proxy_type: Option<ProxyType>,
        inner: Call,
    ) -> Result<ExtrinsicInfo, ProxyError> {
        if delegator.is_zero() {
            return Err(ProxyError::InvalidAccount);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            ProxyError::MetadataRetrieval
        })?;

        let call = Call::new(&meta, PROXY_CALL, &(*delegator, forced_proxy_type, inner))
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't create proxy call");
                ProxyError::CallCreation
            })?;

        let info = self
            .chain
            .submit_and_watch(&meta, call, keyring)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, delegator = %delegator, "couldn't submit and watch extrinsic");
                ProxyError::SubmitAndWatch
            })?;

        Ok(info)
    }

    /// Register `delegate` as a proxy of the keyring's account under the
    /// given capability. Fire-and-forget: the extrinsic is submitted but not
    /// watched.
    pub async fn add_proxy(
        &self,
        delegate: &AccountId,
        proxy_type: ProxyType,
        delay: u32,
        keyring: &Keyring,
    ) -> Result<(), ProxyError> {
        if delegate.is_zero() {
            return Err(ProxyError::InvalidAccount);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            ProxyError::MetadataRetrieval
        })?;

        let call =
            Call::new(&meta, ADD_PROXY_CALL, &(*delegate, proxy_type, delay)).map_err(|e| {
                tracing::error!(error = %e, "couldn't create add_proxy call");
                ProxyError::CallCreation
            })?;

        self.chain
            .submit_extrinsic(&meta, call, keyring)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, delegate = %delegate, "couldn't submit extrinsic");
                ProxyError::ExtrinsicSubmission
            })?;

        Ok(())
    }

    /// The proxy definitions registered for `account`.
    ///
    /// Absence of any entry is `ProxiesNotFound`, distinct from a failed
    /// read.
    pub async fn proxies(&self, account: &AccountId) -> Result<ProxyStorageEntry, ProxyError> {
        if account.is_zero() {
            return Err(ProxyError::InvalidAccount);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            ProxyError::MetadataRetrieval
        })?;

        let encoded_account = codec::encode(account).map_err(|e| {
            tracing::error!(error = %e, "couldn't encode account ID");
            ProxyError::AccountIdEncoding
        })?;

        let storage_key = create_storage_key(&meta, PALLET_NAME, PROXIES_STORAGE, &[&encoded_account])
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't create storage key");
                ProxyError::StorageKeyCreation
            })?;

        let bytes = self
            .chain
            .storage_latest(&storage_key)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "couldn't retrieve proxy storage entry");
                ProxyError::ProxyStorageRetrieval
            })?
            .ok_or_else(|| {
                tracing::debug!(account = %account, "account proxies not found");
                ProxyError::ProxiesNotFound
            })?;

        codec::decode(&bytes).map_err(|e| {
            tracing::error!(error = %e, "couldn't decode proxy storage entry");
            ProxyError::ProxyStorageRetrieval
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_nullables::NullChain;
    use mooring_types::ProxyDefinition;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    #[tokio::test]
    async fn zero_account_rejected_without_network() {
        let chain = Arc::new(NullChain::new());
        chain.fail_metadata(true);
        let delegate = ProxyDelegate::new(Arc::clone(&chain));

        // With metadata failing, reaching the network would surface a
        // different error.
        assert_eq!(
            delegate.proxies(&AccountId::ZERO).await.unwrap_err(),
            ProxyError::InvalidAccount
        );
        assert_eq!(
            delegate
                .add_proxy(&AccountId::ZERO, ProxyType::Any, 0, &chain.keyring(account(1)))
                .await
                .unwrap_err(),
            ProxyError::InvalidAccount
        );
    }

    #[tokio::test]
    async fn proxies_not_found_is_distinct_from_read_failure() {
        let chain = Arc::new(NullChain::new());
        let delegate = ProxyDelegate::new(Arc::clone(&chain));

        assert_eq!(
            delegate.proxies(&account(5)).await.unwrap_err(),
            ProxyError::ProxiesNotFound
        );

        chain.fail_storage(true);
        assert_eq!(
            delegate.proxies(&account(5)).await.unwrap_err(),
            ProxyError::ProxyStorageRetrieval
        );
    }

    #[tokio::test]
    async fn add_proxy_then_read_back() {
        let chain = Arc::new(NullChain::new());
        let delegate = ProxyDelegate::new(Arc::clone(&chain));

        let delegator = account(1);
        let operator = account(2);
        let keyring = chain.keyring(delegator);

        delegate
            .add_proxy(&operator, ProxyType::PodOperation, 0, &keyring)
            .await
            .unwrap();

        let entry = delegate.proxies(&delegator).await.unwrap();
        assert_eq!(
            entry.definitions,
            vec![ProxyDefinition {
                delegate: operator,
                proxy_type: ProxyType::PodOperation,
                delay: 0,
            }]
        );
    }

    #[tokio::test]
    async fn proxy_call_requires_registered_relationship() {
        let chain = Arc::new(NullChain::new());
        let delegate = ProxyDelegate::new(Arc::clone(&chain));

        let delegator = account(1);
        let operator = account(2);
        let operator_keyring = chain.keyring(operator);

        let meta = chain.metadata();
        let inner = Call::new(&meta, "Proxy.add_proxy", &(account(9), ProxyType::Any, 0u32))
            .unwrap();

        // No relationship registered: the chain rejects the dispatch.
        let err = delegate
            .proxy_call(&delegator, &operator_keyring, None, inner.clone())
            .await
            .unwrap_err();
        assert_eq!(err, ProxyError::SubmitAndWatch);

        // Register the relationship and the same call goes through.
        delegate
            .add_proxy(&operator, ProxyType::Any, 0, &chain.keyring(delegator))
            .await
            .unwrap();
        delegate
            .proxy_call(&delegator, &operator_keyring, None, inner)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn forced_capability_must_match() {
        let chain = Arc::new(NullChain::new());
        let delegate = ProxyDelegate::new(Arc::clone(&chain));

        let delegator = account(1);
        let operator = account(2);

        delegate
            .add_proxy(&operator, ProxyType::PodOperation, 0, &chain.keyring(delegator))
            .await
            .unwrap();

        let meta = chain.metadata();
        let inner = Call::new(&meta, "Proxy.add_proxy", &(account(9), ProxyType::Any, 0u32))
            .unwrap();

        let err = delegate
            .proxy_call(
                &delegator,
                &chain.keyring(operator),
                Some(ProxyType::KeystoreManagement),
                inner.clone(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ProxyError::SubmitAndWatch);

        delegate
            .proxy_call(
                &delegator,
                &chain.keyring(operator),
                Some(ProxyType::PodOperation),
                inner,
            )
            .await
            .unwrap();
    }
}

//! Account provisioning.

use crate::error::IdentityError;
use crate::validator::IdentityValidator;
use mooring_chain::ChainClient;
use mooring_crypto::generate_keypair;
use mooring_jobs::Dispatcher;
use mooring_store::{Account, AccountStore};
use mooring_types::{AccountId, ProtocolId};
use std::sync::Arc;
use url::Url;

/// Request to bind a chain identity to a new local account.
pub struct CreateIdentityRequest {
    pub identity: AccountId,
    pub webhook_url: Option<String>,
    pub precommit_enabled: bool,
}

/// Creates local accounts for on-chain identities.
///
/// Not self-concurrency-safe: two concurrent calls for a never-seen identity
/// can both pass the existence check; the account store's uniqueness
/// constraint is the only protection.
pub struct AccountProvisioner<C, S, D> {
    validator: IdentityValidator<C>,
    store: Arc<S>,
    dispatcher: Arc<D>,
}

impl<C, S, D> AccountProvisioner<C, S, D>
where
    C: ChainClient,
    S: AccountStore,
    D: Dispatcher,
{
    pub fn new(validator: IdentityValidator<C>, store: Arc<S>, dispatcher: Arc<D>) -> Self {
        Self {
            validator,
            store,
            dispatcher,
        }
    }

    /// Validate the request, confirm the identity's on-chain footprint,
    /// generate a fresh document-signing key pair, persist the account, and
    /// dispatch the network-reachability announcement.
    ///
    /// A dispatch failure is reported but deliberately does not roll back
    /// the persisted account: the announcement is independently retryable,
    /// while persistence failure aborts before any chain state is touched.
    /// Key registration with the keystore runs out-of-band as a queued task,
    /// because it needs a proxy relationship that may not exist yet.
    pub async fn create_identity(
        &self,
        req: &CreateIdentityRequest,
    ) -> Result<Account, IdentityError> {
        self.validate_request(req).await?;

        let signing_key = generate_keypair();

        let account = Account::new(
            req.identity,
            signing_key,
            req.webhook_url.clone().filter(|url| !url.is_empty()),
            req.precommit_enabled,
        );

        self.store.create_account(&account).map_err(|e| {
            tracing::error!(error = %e, identity = %req.identity, "couldn't store account");
            IdentityError::AccountStorage
        })?;

        let protocol_id = ProtocolId::for_identity(&req.identity);

        if let Err(e) = self.dispatcher.dispatch(&protocol_id).await {
            tracing::error!(error = %e, identity = %req.identity, "couldn't dispatch protocol ID");
            return Err(IdentityError::ProtocolIdDispatch);
        }

        Ok(account)
    }

    async fn validate_request(&self, req: &CreateIdentityRequest) -> Result<(), IdentityError> {
        if let Some(webhook_url) = req.webhook_url.as_deref() {
            if !webhook_url.is_empty() && Url::parse(webhook_url).is_err() {
                tracing::error!(identity = %req.identity, "invalid webhook URL");
                return Err(IdentityError::InvalidWebhookUrl);
            }
        }

        self.validator.validate_account(&req.identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_jobs::DispatchError;
    use mooring_nullables::NullChain;
    use mooring_pallets::{KeystoreRegistry, ProxyDelegate};
    use mooring_store::{MemoryAccountStore, PodOperator, StoreError};
    use std::sync::Mutex;

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    /// Records dispatched protocol IDs; failure injectable.
    #[derive(Default)]
    struct RecordingDispatcher {
        dispatched: Mutex<Vec<ProtocolId>>,
        fail: Mutex<bool>,
    }

    impl RecordingDispatcher {
        fn dispatched(&self) -> Vec<ProtocolId> {
            self.dispatched.lock().unwrap().clone()
        }

        fn fail(&self, on: bool) {
            *self.fail.lock().unwrap() = on;
        }
    }

    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, protocol_id: &ProtocolId) -> Result<(), DispatchError> {
            if *self.fail.lock().unwrap() {
                return Err(DispatchError::Unavailable("injected failure".into()));
            }
            self.dispatched.lock().unwrap().push(protocol_id.clone());
            Ok(())
        }
    }

    struct Fixture {
        chain: Arc<NullChain>,
        store: Arc<MemoryAccountStore>,
        dispatcher: Arc<RecordingDispatcher>,
        provisioner: AccountProvisioner<NullChain, MemoryAccountStore, RecordingDispatcher>,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(NullChain::new());
        let operator = chain.keyring(account(0xee));
        let proxy = ProxyDelegate::new(Arc::clone(&chain));
        let keystore = KeystoreRegistry::new(Arc::clone(&chain), proxy.clone(), operator);
        let validator = IdentityValidator::new(Arc::clone(&chain), keystore, proxy);

        let store = Arc::new(MemoryAccountStore::new(PodOperator::new(
            account(0xee),
            mooring_crypto::generate_keypair(),
        )));
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let provisioner =
            AccountProvisioner::new(validator, Arc::clone(&store), Arc::clone(&dispatcher));

        Fixture {
            chain,
            store,
            dispatcher,
            provisioner,
        }
    }

    fn request(identity: AccountId) -> CreateIdentityRequest {
        CreateIdentityRequest {
            identity,
            webhook_url: Some("https://example.com/webhook".into()),
            precommit_enabled: true,
        }
    }

    #[tokio::test]
    async fn creates_account_and_announces_protocol() {
        let f = fixture();
        let identity = account(1);
        f.chain.set_account_present(&identity);

        let created = f.provisioner.create_identity(&request(identity)).await.unwrap();
        assert_eq!(created.identity(), &identity);
        assert_eq!(created.webhook_url(), Some("https://example.com/webhook"));
        assert!(created.precommit_enabled());

        let stored = f.store.account(&identity).unwrap();
        assert_eq!(stored.signing_public_key(), created.signing_public_key());

        assert_eq!(
            f.dispatcher.dispatched(),
            vec![ProtocolId::for_identity(&identity)]
        );
    }

    #[tokio::test]
    async fn empty_webhook_is_allowed_and_normalized() {
        let f = fixture();
        let identity = account(1);
        f.chain.set_account_present(&identity);

        let created = f
            .provisioner
            .create_identity(&CreateIdentityRequest {
                identity,
                webhook_url: Some(String::new()),
                precommit_enabled: false,
            })
            .await
            .unwrap();
        assert_eq!(created.webhook_url(), None);
    }

    #[tokio::test]
    async fn malformed_webhook_is_rejected_before_anything_happens() {
        let f = fixture();
        let identity = account(1);
        f.chain.set_account_present(&identity);

        let mut req = request(identity);
        req.webhook_url = Some("not a url".into());

        assert_eq!(
            f.provisioner.create_identity(&req).await.unwrap_err(),
            IdentityError::InvalidWebhookUrl
        );
        assert!(matches!(
            f.store.account(&identity),
            Err(StoreError::NotFound(_))
        ));
        assert!(f.dispatcher.dispatched().is_empty());
    }

    #[tokio::test]
    async fn unknown_identity_is_rejected() {
        let f = fixture();
        assert_eq!(
            f.provisioner
                .create_identity(&request(account(1)))
                .await
                .unwrap_err(),
            IdentityError::InvalidAccount
        );
    }

    #[tokio::test]
    async fn anonymous_proxy_identity_can_be_provisioned() {
        let f = fixture();
        let identity = account(1);
        // Absent directly, but reachable as an Any delegate.
        ProxyDelegate::new(Arc::clone(&f.chain))
            .add_proxy(
                &account(2),
                mooring_types::ProxyType::Any,
                0,
                &f.chain.keyring(identity),
            )
            .await
            .unwrap();

        f.provisioner.create_identity(&request(identity)).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_identity_fails_persistence() {
        let f = fixture();
        let identity = account(1);
        f.chain.set_account_present(&identity);

        f.provisioner.create_identity(&request(identity)).await.unwrap();
        assert_eq!(
            f.provisioner
                .create_identity(&request(identity))
                .await
                .unwrap_err(),
            IdentityError::AccountStorage
        );
    }

    #[tokio::test]
    async fn dispatch_failure_does_not_roll_back_the_account() {
        let f = fixture();
        let identity = account(1);
        f.chain.set_account_present(&identity);
        f.dispatcher.fail(true);

        assert_eq!(
            f.provisioner
                .create_identity(&request(identity))
                .await
                .unwrap_err(),
            IdentityError::ProtocolIdDispatch
        );

        // The account stayed; the announcement is retryable on its own.
        f.store.account(&identity).unwrap();
    }

    #[tokio::test]
    async fn zero_identity_is_rejected() {
        let f = fixture();
        assert_eq!(
            f.provisioner
                .create_identity(&request(AccountId::ZERO))
                .await
                .unwrap_err(),
            IdentityError::InvalidAccountId
        );
    }
}

//! Two-phase document commitments via the `Anchor` pallet.
//!
//! Revealing a document root directly would let a third party anchor the
//! same content first. A pre-commit stakes a claim on the anchor slot with a
//! signing root that does not leak the document root; the later commit
//! proves authorship by revealing the proof that binds them. The chain
//! verifies that binding — this client does not re-derive it locally.

use crate::proxy::ProxyDelegate;
use mooring_chain::{block_timestamp, Call, ChainClient, Keyring};
use mooring_types::{AccountId, AnchorId, BlockNumber, DocumentRoot, ProxyType, Timestamp};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const PALLET_NAME: &str = "Anchor";

pub const PRE_COMMIT_CALL: &str = "Anchor.pre_commit";
pub const COMMIT_CALL: &str = "Anchor.commit";

/// Read-only RPC method resolving an anchor by its identifier.
pub const GET_BY_ID_RPC: &str = "anchor_getAnchorById";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnchorError {
    #[error("invalid identity")]
    InvalidIdentity,

    #[error("anchor ID is zero")]
    ZeroAnchorId,

    #[error("signing root is zero")]
    ZeroSigningRoot,

    #[error("document root is zero")]
    ZeroDocumentRoot,

    #[error("couldn't retrieve metadata")]
    MetadataRetrieval,

    #[error("couldn't create call")]
    CallCreation,

    #[error("couldn't perform proxy call")]
    ProxyCall,

    #[error("couldn't retrieve anchor")]
    Retrieval,

    #[error("document root is empty")]
    EmptyDocumentRoot,
}

/// Response of the anchor lookup RPC.
#[derive(Debug, Deserialize)]
struct AnchorQueryResponse {
    #[allow(dead_code)]
    id: String,
    doc_root: String,
    anchored_block: BlockNumber,
}

/// Chain-backed two-phase commitment store for document roots.
///
/// Per anchor the chain enforces Unlocked → PreCommitted → Committed with no
/// reverse transition; a repeated commit is rejected on chain and surfaces
/// here as a proxy-call failure.
pub struct AnchorRegistry<C> {
    chain: Arc<C>,
    proxy: ProxyDelegate<C>,
    pod_operator: Keyring,
}

impl<C> Clone for AnchorRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            proxy: self.proxy.clone(),
            pod_operator: self.pod_operator.clone(),
        }
    }
}

impl<C: ChainClient> AnchorRegistry<C> {
    pub fn new(chain: Arc<C>, proxy: ProxyDelegate<C>, pod_operator: Keyring) -> Self {
        Self {
            chain,
            proxy,
            pod_operator,
        }
    }

    /// Reserve `anchor_id` against a blind commitment so no other actor can
    /// claim it before the real root is revealed.
    pub async fn pre_commit(
        &self,
        identity: &AccountId,
        anchor_id: AnchorId,
        signing_root: DocumentRoot,
    ) -> Result<(), AnchorError> {
        if identity.is_zero() {
            return Err(AnchorError::InvalidIdentity);
        }
        if anchor_id.is_zero() {
            return Err(AnchorError::ZeroAnchorId);
        }
        if signing_root.is_zero() {
            return Err(AnchorError::ZeroSigningRoot);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            AnchorError::MetadataRetrieval
        })?;

        let call = Call::new(&meta, PRE_COMMIT_CALL, &(anchor_id, signing_root)).map_err(|e| {
            tracing::error!(error = %e, "couldn't create pre_commit call");
            AnchorError::CallCreation
        })?;

        self.proxy
            .proxy_call(
                identity,
                &self.pod_operator,
                Some(ProxyType::PodOperation),
                call,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, anchor = %anchor_id, "couldn't execute proxy call");
                AnchorError::ProxyCall
            })?;

        Ok(())
    }

    /// Commit `document_root` against `anchor_id`.
    ///
    /// `lifespan` is the freshness window attached to the commit, not a
    /// deletion deadline: the anchor expires `lifespan` from now. When a
    /// pre-commit holds the slot, the chain checks that `proof` combined
    /// with the pre-committed signing root reconstructs `document_root`.
    pub async fn commit(
        &self,
        identity: &AccountId,
        anchor_id: AnchorId,
        document_root: DocumentRoot,
        proof: [u8; 32],
        lifespan: Duration,
    ) -> Result<(), AnchorError> {
        if identity.is_zero() {
            return Err(AnchorError::InvalidIdentity);
        }
        if anchor_id.is_zero() {
            return Err(AnchorError::ZeroAnchorId);
        }
        if document_root.is_zero() {
            return Err(AnchorError::ZeroDocumentRoot);
        }

        let meta = self.chain.metadata_latest().await.map_err(|e| {
            tracing::error!(error = %e, "couldn't retrieve metadata");
            AnchorError::MetadataRetrieval
        })?;

        let expires_at = Timestamp::now().plus(lifespan);

        let call = Call::new(
            &meta,
            COMMIT_CALL,
            &(anchor_id, document_root, proof, expires_at),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "couldn't create commit call");
            AnchorError::CallCreation
        })?;

        self.proxy
            .proxy_call(
                identity,
                &self.pod_operator,
                Some(ProxyType::PodOperation),
                call,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, anchor = %anchor_id, "couldn't execute proxy call");
                AnchorError::ProxyCall
            })?;

        Ok(())
    }

    /// The committed document root and its anchoring wall-clock time.
    ///
    /// An RPC failure is `Retrieval`; a successful read with a zero root is
    /// `EmptyDocumentRoot`. The two are never conflated.
    pub async fn anchor(&self, anchor_id: AnchorId) -> Result<(DocumentRoot, Timestamp), AnchorError> {
        if anchor_id.is_zero() {
            return Err(AnchorError::ZeroAnchorId);
        }

        let result = self
            .chain
            .rpc_call(
                GET_BY_ID_RPC,
                json!([format!("0x{}", hex::encode(anchor_id.as_bytes()))]),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, anchor = %anchor_id, "couldn't retrieve anchor");
                AnchorError::Retrieval
            })?;

        let response: AnchorQueryResponse = serde_json::from_value(result).map_err(|e| {
            tracing::error!(error = %e, anchor = %anchor_id, "malformed anchor response");
            AnchorError::Retrieval
        })?;

        let doc_root = decode_root(&response.doc_root).ok_or_else(|| {
            tracing::error!(anchor = %anchor_id, "malformed document root in anchor response");
            AnchorError::Retrieval
        })?;

        if doc_root.is_zero() {
            tracing::error!(anchor = %anchor_id, "document root is empty");
            return Err(AnchorError::EmptyDocumentRoot);
        }

        let anchored_time = self
            .block_time(response.anchored_block)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, anchor = %anchor_id, "couldn't resolve anchoring time");
                AnchorError::Retrieval
            })?;

        Ok((doc_root, anchored_time))
    }

    async fn block_time(
        &self,
        number: BlockNumber,
    ) -> Result<Timestamp, mooring_chain::ChainError> {
        let hash = self.chain.block_hash(number).await?;
        let block = self.chain.block(&hash).await?;
        let meta = self.chain.metadata_latest().await?;

        block_timestamp(&meta, &block).ok_or(mooring_chain::ChainError::Decoding(
            "timestamp extrinsic not found".into(),
        ))
    }
}

fn decode_root(hex_root: &str) -> Option<DocumentRoot> {
    let bytes = hex::decode(hex_root.trim_start_matches("0x")).ok()?;
    let arr: [u8; 32] = bytes.try_into().ok()?;
    Some(DocumentRoot::new(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_crypto::combine_roots;
    use mooring_nullables::NullChain;

    const LIFESPAN: Duration = Duration::from_secs(3600);

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    /// Registry wired to a chain where `identity` has delegated pod
    /// operation to the pod operator.
    async fn registry(chain: &Arc<NullChain>, identity: AccountId) -> AnchorRegistry<NullChain> {
        let operator = account(0xee);
        let proxy = ProxyDelegate::new(Arc::clone(chain));
        proxy
            .add_proxy(
                &operator,
                ProxyType::PodOperation,
                0,
                &chain.keyring(identity),
            )
            .await
            .unwrap();
        AnchorRegistry::new(Arc::clone(chain), proxy, chain.keyring(operator))
    }

    #[tokio::test]
    async fn pre_commit_then_commit_then_lookup() {
        let chain = Arc::new(NullChain::new());
        let identity = account(1);
        let registry = registry(&chain, identity).await;

        let anchor_id = AnchorId::new([10u8; 32]);
        let signing_root = DocumentRoot::new([20u8; 32]);
        let proof = [30u8; 32];
        let document_root = combine_roots(&signing_root, &proof);

        registry
            .pre_commit(&identity, anchor_id, signing_root)
            .await
            .unwrap();
        registry
            .commit(&identity, anchor_id, document_root, proof, LIFESPAN)
            .await
            .unwrap();

        let (root, anchored_time) = registry.anchor(anchor_id).await.unwrap();
        assert_eq!(root, document_root);
        assert!(anchored_time > Timestamp::EPOCH);
    }

    #[tokio::test]
    async fn commit_with_wrong_proof_is_rejected_by_chain() {
        let chain = Arc::new(NullChain::new());
        let identity = account(1);
        let registry = registry(&chain, identity).await;

        let anchor_id = AnchorId::new([11u8; 32]);
        let signing_root = DocumentRoot::new([21u8; 32]);

        registry
            .pre_commit(&identity, anchor_id, signing_root)
            .await
            .unwrap();

        let err = registry
            .commit(&identity, anchor_id, DocumentRoot::new([1u8; 32]), [2u8; 32], LIFESPAN)
            .await
            .unwrap_err();
        assert_eq!(err, AnchorError::ProxyCall);
    }

    #[tokio::test]
    async fn recommit_is_rejected_by_chain() {
        let chain = Arc::new(NullChain::new());
        let identity = account(1);
        let registry = registry(&chain, identity).await;

        let anchor_id = AnchorId::new([12u8; 32]);
        let signing_root = DocumentRoot::new([22u8; 32]);
        let proof = [32u8; 32];
        let document_root = combine_roots(&signing_root, &proof);

        registry
            .pre_commit(&identity, anchor_id, signing_root)
            .await
            .unwrap();
        registry
            .commit(&identity, anchor_id, document_root, proof, LIFESPAN)
            .await
            .unwrap();

        let err = registry
            .commit(&identity, anchor_id, document_root, proof, LIFESPAN)
            .await
            .unwrap_err();
        assert_eq!(err, AnchorError::ProxyCall);
    }

    #[tokio::test]
    async fn pre_commit_holds_the_slot_against_other_claimants() {
        let chain = Arc::new(NullChain::new());
        let first = account(1);
        let second = account(2);
        let first_registry = registry(&chain, first).await;
        let second_registry = registry(&chain, second).await;

        let anchor_id = AnchorId::new([13u8; 32]);

        first_registry
            .pre_commit(&first, anchor_id, DocumentRoot::new([23u8; 32]))
            .await
            .unwrap();

        let err = second_registry
            .pre_commit(&second, anchor_id, DocumentRoot::new([24u8; 32]))
            .await
            .unwrap_err();
        assert_eq!(err, AnchorError::ProxyCall);
    }

    #[tokio::test]
    async fn lookup_errors_are_never_conflated() {
        let chain = Arc::new(NullChain::new());
        let identity = account(1);
        let registry = registry(&chain, identity).await;

        // Never committed, read succeeds with a zero root.
        let absent = AnchorId::new([14u8; 32]);
        assert_eq!(
            registry.anchor(absent).await.unwrap_err(),
            AnchorError::EmptyDocumentRoot
        );

        // Underlying RPC fails.
        chain.fail_rpc(true);
        assert_eq!(
            registry.anchor(absent).await.unwrap_err(),
            AnchorError::Retrieval
        );
    }

    #[tokio::test]
    async fn zero_inputs_rejected_before_any_network_call() {
        let chain = Arc::new(NullChain::new());
        let identity = account(1);
        let registry = registry(&chain, identity).await;
        chain.fail_metadata(true);
        chain.fail_rpc(true);

        let id = AnchorId::new([15u8; 32]);
        let root = DocumentRoot::new([25u8; 32]);

        assert_eq!(
            registry
                .pre_commit(&identity, AnchorId::ZERO, root)
                .await
                .unwrap_err(),
            AnchorError::ZeroAnchorId
        );
        assert_eq!(
            registry
                .pre_commit(&identity, id, DocumentRoot::ZERO)
                .await
                .unwrap_err(),
            AnchorError::ZeroSigningRoot
        );
        assert_eq!(
            registry
                .commit(&identity, id, DocumentRoot::ZERO, [0u8; 32], LIFESPAN)
                .await
                .unwrap_err(),
            AnchorError::ZeroDocumentRoot
        );
        assert_eq!(
            registry.anchor(AnchorId::ZERO).await.unwrap_err(),
            AnchorError::ZeroAnchorId
        );
    }
}

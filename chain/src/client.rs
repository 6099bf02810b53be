//! The chain-client capability contract.

use crate::block::{Block, ExtrinsicInfo};
use crate::call::Call;
use crate::error::ChainError;
use crate::keyring::Keyring;
use crate::metadata::Metadata;
use crate::storage::StorageKey;
use mooring_types::{BlockHash, BlockNumber, Signature, TxHash};

/// Access to the connected chain.
///
/// Every method performs network I/O and resolves only when the node
/// answers; callers that need a deadline wrap the future in
/// `tokio::time::timeout`. Cancelling mid-`submit_and_watch` aborts the
/// wait without guaranteeing the extrinsic was not included — submission is
/// at-most-once-attempted and must never be blindly retried.
#[allow(async_fn_in_trait)]
pub trait ChainClient: Send + Sync {
    /// Latest runtime metadata.
    async fn metadata_latest(&self) -> Result<Metadata, ChainError>;

    /// Latest value under a storage key. `Ok(None)` means the key is absent,
    /// which is distinct from a read failure.
    async fn storage_latest(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, ChainError>;

    /// Generic read-only RPC.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError>;

    /// Sign and submit an extrinsic without watching for inclusion.
    /// Returns the transaction hash, the latest block number observed at
    /// submission, and the signature attached to the extrinsic.
    async fn submit_extrinsic(
        &self,
        meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<(TxHash, BlockNumber, Signature), ChainError>;

    /// Sign, submit, and wait until the extrinsic is included in a block.
    async fn submit_and_watch(
        &self,
        meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<ExtrinsicInfo, ChainError>;

    /// Hash of the block at the given height.
    async fn block_hash(&self, number: BlockNumber) -> Result<BlockHash, ChainError>;

    /// Block body for the given hash.
    async fn block(&self, hash: &BlockHash) -> Result<Block, ChainError>;
}

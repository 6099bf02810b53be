use thiserror::Error;

/// Errors surfaced by the chain client layer.
///
/// Each variant tags one failure stage; callers above this crate reduce them
/// to their own fixed error sets and never pass them through verbatim.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("unknown call: {0}")]
    UnknownCall(String),

    #[error("unknown storage item: {0}")]
    UnknownStorageItem(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("decoding failed: {0}")]
    Decoding(String),

    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),

    #[error("extrinsic dispatch failed: {0}")]
    Dispatch(String),

    #[error("block not found at height {0}")]
    BlockNotFound(u64),

    #[error("block not found for hash {0}")]
    BlockHashUnknown(mooring_types::BlockHash),
}

//! Chain client contract for the Mooring node.
//!
//! Everything above this crate treats the chain as a primitive capability:
//! metadata retrieval, typed storage reads, call construction, extrinsic
//! submission (fire-and-forget and watch-until-included), block lookups, and
//! generic read-only RPC. The [`ChainClient`] trait captures that contract;
//! [`HttpChainClient`] implements it over JSON-RPC.

pub mod block;
pub mod call;
pub mod client;
pub mod codec;
pub mod error;
pub mod http;
pub mod keyring;
pub mod metadata;
pub mod storage;

pub use block::{block_timestamp, Block, Extrinsic, ExtrinsicInfo};
pub use call::Call;
pub use client::ChainClient;
pub use error::ChainError;
pub use http::HttpChainClient;
pub use keyring::Keyring;
pub use metadata::{CallIndex, Metadata, PalletMetadata};
pub use storage::{create_storage_key, StorageKey};

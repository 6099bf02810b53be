//! Wire encoding for call arguments and storage values.
//!
//! The permissioned chain speaks bincode for every encoded value; this
//! module is the single place the workspace touches the codec.

use crate::error::ChainError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value for use as a call argument tuple or storage value.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ChainError> {
    bincode::serialize(value).map_err(|e| ChainError::Encoding(e.to_string()))
}

/// Decode a value read back from storage or a block.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChainError> {
    bincode::deserialize(bytes).map_err(|e| ChainError::Decoding(e.to_string()))
}

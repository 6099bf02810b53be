//! JSON-RPC chain client over HTTP.

use crate::block::{Block, ExtrinsicInfo};
use crate::call::Call;
use crate::client::ChainClient;
use crate::codec;
use crate::error::ChainError;
use crate::keyring::Keyring;
use crate::metadata::Metadata;
use crate::storage::StorageKey;
use mooring_crypto::blake2b_256;
use mooring_types::{AccountId, BlockHash, BlockNumber, Signature, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The wire form of a signed extrinsic: the call, its signer, and the
/// signature over the encoded call.
#[derive(Serialize, Deserialize)]
struct SignedExtrinsic {
    call: Call,
    signer: AccountId,
    signature: Signature,
}

/// HTTP client for a chain node's JSON-RPC endpoint.
///
/// Wraps `reqwest::Client` with the node's base URL and provides the
/// [`ChainClient`] contract on top of the generic `rpc_call`.
#[derive(Clone)]
pub struct HttpChainClient {
    http: reqwest::Client,
    node_url: String,
    request_id: std::sync::Arc<AtomicU64>,
}

impl HttpChainClient {
    /// Create a new client targeting the given base URL
    /// (e.g. `http://127.0.0.1:9933`).
    pub fn new(node_url: impl Into<String>) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            node_url: node_url.into(),
            request_id: std::sync::Arc::new(AtomicU64::new(1)),
        })
    }

    /// The configured node URL.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    async fn rpc(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.node_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::MalformedResponse(format!("invalid JSON response: {e}")))?;

        if let Some(err) = envelope.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown node error");
            return Err(ChainError::Transport(format!("node error: {message}")));
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::MalformedResponse("missing result field".into()))
    }

    fn sign_call(&self, call: Call, keyring: &Keyring) -> Result<(Vec<u8>, TxHash, Signature), ChainError> {
        let call_bytes = codec::encode(&call)?;
        let signature = keyring.sign(&call_bytes);
        let signed = SignedExtrinsic {
            call,
            signer: *keyring.account_id(),
            signature: signature.clone(),
        };
        let payload = codec::encode(&signed)?;
        let tx_hash = TxHash::new(blake2b_256(&payload));
        Ok((payload, tx_hash, signature))
    }
}

impl ChainClient for HttpChainClient {
    async fn metadata_latest(&self) -> Result<Metadata, ChainError> {
        let result = self.rpc("state_getMetadata", json!([])).await?;
        serde_json::from_value(result)
            .map_err(|e| ChainError::MalformedResponse(format!("invalid metadata: {e}")))
    }

    async fn storage_latest(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, ChainError> {
        let result = self
            .rpc("state_getStorage", json!([to_hex(key.as_bytes())]))
            .await?;

        match result {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => from_hex(&s).map(Some),
            other => Err(ChainError::MalformedResponse(format!(
                "unexpected storage value: {other}"
            ))),
        }
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        self.rpc(method, params).await
    }

    async fn submit_extrinsic(
        &self,
        _meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<(TxHash, BlockNumber, Signature), ChainError> {
        let (payload, tx_hash, signature) = self.sign_call(call, keyring)?;
        let result = self
            .rpc("author_submitExtrinsic", json!([to_hex(&payload)]))
            .await?;

        let block_number = result
            .get("block_number")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| ChainError::MalformedResponse("missing block_number".into()))?;

        Ok((tx_hash, block_number, signature))
    }

    async fn submit_and_watch(
        &self,
        _meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<ExtrinsicInfo, ChainError> {
        let (payload, tx_hash, _) = self.sign_call(call, keyring)?;
        let result = self
            .rpc("author_submitAndWatchExtrinsic", json!([to_hex(&payload)]))
            .await?;

        if let Some(err) = result.get("dispatch_error").and_then(|e| e.as_str()) {
            return Err(ChainError::Dispatch(err.to_string()));
        }

        let block_hash = hash32(&result, "block_hash")?;
        let block_number = result
            .get("block_number")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| ChainError::MalformedResponse("missing block_number".into()))?;
        let index = result
            .get("index")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| ChainError::MalformedResponse("missing index".into()))?;

        Ok(ExtrinsicInfo {
            tx_hash,
            block_hash: BlockHash::new(block_hash),
            block_number,
            index: index as u32,
        })
    }

    async fn block_hash(&self, number: BlockNumber) -> Result<BlockHash, ChainError> {
        let result = self.rpc("chain_getBlockHash", json!([number])).await?;
        match result {
            serde_json::Value::Null => Err(ChainError::BlockNotFound(number)),
            serde_json::Value::String(s) => {
                let bytes = from_hex(&s)?;
                let arr: [u8; 32] = bytes.try_into().map_err(|_| {
                    ChainError::MalformedResponse("block hash is not 32 bytes".into())
                })?;
                Ok(BlockHash::new(arr))
            }
            other => Err(ChainError::MalformedResponse(format!(
                "unexpected block hash: {other}"
            ))),
        }
    }

    async fn block(&self, hash: &BlockHash) -> Result<Block, ChainError> {
        let result = self
            .rpc("chain_getBlock", json!([to_hex(hash.as_bytes())]))
            .await?;
        if result.is_null() {
            return Err(ChainError::BlockHashUnknown(*hash));
        }
        serde_json::from_value(result)
            .map_err(|e| ChainError::MalformedResponse(format!("invalid block: {e}")))
    }
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn from_hex(s: &str) -> Result<Vec<u8>, ChainError> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| ChainError::MalformedResponse(format!("invalid hex: {e}")))
}

fn hash32(value: &serde_json::Value, field: &str) -> Result<[u8; 32], ChainError> {
    let s = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ChainError::MalformedResponse(format!("missing {field}")))?;
    let bytes = from_hex(s)?;
    bytes
        .try_into()
        .map_err(|_| ChainError::MalformedResponse(format!("{field} is not 32 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0xff, 0x10];
        assert_eq!(from_hex(&to_hex(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn from_hex_accepts_unprefixed() {
        assert_eq!(from_hex("0aff").unwrap(), vec![0x0a, 0xff]);
    }

    #[test]
    fn invalid_hex_is_malformed() {
        assert!(matches!(
            from_hex("0xzz"),
            Err(ChainError::MalformedResponse(_))
        ));
    }
}

//! Nullable chain — a deterministic in-memory chain client.
//!
//! Implements the full [`ChainClient`] contract against a programmable
//! in-process state machine: storage map, synthesized blocks (each stamped
//! by a timestamp-set inherent), proxy-mediated dispatch, keystore records
//! with monotonic revocation, and two-phase anchor commitments. Failures can
//! be injected per stage. Block times advance on a fixed interval from a
//! fixed genesis, so every test run observes identical timestamps.

use mooring_chain::{
    codec, create_storage_key, Block, Call, ChainClient, ChainError, Extrinsic, ExtrinsicInfo,
    Keyring, Metadata, PalletMetadata, StorageKey,
};
use mooring_crypto::{blake2b_256, combine_roots, keypair_from_seed};
use mooring_types::{
    AccountId, AddKey, AnchorId, BlockHash, BlockNumber, DocumentRoot, KeyHash, KeyId, KeyPurpose,
    KeyRecord, ProxyDefinition, ProxyStorageEntry, ProxyType, Signature, Timestamp, TxHash,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const GENESIS_TIME_MILLIS: u64 = 1_600_000_000_000;
const BLOCK_INTERVAL_MILLIS: u64 = 6_000;

const KEY_DEPOSIT: u128 = 100;
const PROXY_DEPOSIT: u128 = 10;

#[derive(Default)]
struct FailureInjection {
    metadata: bool,
    storage: bool,
    rpc: bool,
    submission: bool,
}

struct ChainState {
    storage: HashMap<Vec<u8>, Vec<u8>>,
    blocks: Vec<Block>,
    block_hashes: Vec<BlockHash>,
    anchors: HashMap<AnchorId, (DocumentRoot, BlockNumber)>,
    pre_commits: HashMap<AnchorId, DocumentRoot>,
    submitted: usize,
    fail: FailureInjection,
}

/// A deterministic chain for testing.
///
/// State only changes through submitted extrinsics or explicit setters.
pub struct NullChain {
    metadata: Metadata,
    state: Mutex<ChainState>,
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl NullChain {
    pub fn new() -> Self {
        let metadata = runtime_metadata();
        let chain = Self {
            metadata,
            state: Mutex::new(ChainState {
                storage: HashMap::new(),
                blocks: Vec::new(),
                block_hashes: Vec::new(),
                anchors: HashMap::new(),
                pre_commits: HashMap::new(),
                submitted: 0,
                fail: FailureInjection::default(),
            }),
        };
        // Genesis block so height 0 resolves like any other.
        {
            let mut state = chain.lock();
            let meta = chain.metadata.clone();
            push_block(&mut state, &meta, None);
        }
        chain
    }

    /// The runtime metadata this chain serves.
    pub fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    /// A keyring for `account` with a key pair derived deterministically
    /// from the account bytes.
    pub fn keyring(&self, account: AccountId) -> Keyring {
        Keyring::new(account, Arc::new(keypair_from_seed(account.as_bytes())))
    }

    pub fn fail_metadata(&self, on: bool) {
        self.lock().fail.metadata = on;
    }

    pub fn fail_storage(&self, on: bool) {
        self.lock().fail.storage = on;
    }

    pub fn fail_rpc(&self, on: bool) {
        self.lock().fail.rpc = on;
    }

    pub fn fail_submission(&self, on: bool) {
        self.lock().fail.submission = on;
    }

    /// Number of extrinsics accepted so far (both submission flavors).
    pub fn submitted_count(&self) -> usize {
        self.lock().submitted
    }

    /// Mark `account` as directly present on chain (funded system account).
    pub fn set_account_present(&self, account: &AccountId) {
        let key = account_storage_key(&self.metadata, account)
            .expect("runtime metadata contains System.Account");
        let value = codec::encode(&0u64).expect("encode account nonce");
        self.lock().storage.insert(key.0, value);
    }

    /// Write a raw value under a storage key, bypassing dispatch. Lets
    /// tests stage arbitrary (including corrupt) chain state.
    pub fn set_raw_storage(&self, key: StorageKey, value: Vec<u8>) {
        self.lock().storage.insert(key.0, value);
    }

    /// Wall-clock moment of the block at `number`, if it exists.
    pub fn block_time(&self, number: BlockNumber) -> Option<Timestamp> {
        let state = self.lock();
        if (number as usize) < state.blocks.len() {
            Some(block_moment(number))
        } else {
            None
        }
    }

    /// Height of the latest block.
    pub fn current_block(&self) -> BlockNumber {
        self.lock().blocks.len() as BlockNumber - 1
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().expect("chain state lock poisoned")
    }

    fn submit(&self, call: Call, origin: AccountId) -> Result<ExtrinsicInfo, ChainError> {
        let mut state = self.lock();
        if state.fail.submission {
            return Err(ChainError::Transport("injected submission failure".into()));
        }

        let number = state.blocks.len() as BlockNumber;
        apply_call(&mut state, &self.metadata, origin, &call, number)
            .map_err(ChainError::Dispatch)?;

        let extrinsic = Extrinsic {
            call: call.clone(),
            signer: Some(origin),
        };
        let block_hash = push_block(&mut state, &self.metadata, Some(extrinsic));
        state.submitted += 1;

        let mut tx_bytes = number.to_le_bytes().to_vec();
        tx_bytes.extend_from_slice(&call.args);

        Ok(ExtrinsicInfo {
            tx_hash: TxHash::new(blake2b_256(&tx_bytes)),
            block_hash,
            block_number: number,
            index: 1,
        })
    }
}

impl ChainClient for NullChain {
    async fn metadata_latest(&self) -> Result<Metadata, ChainError> {
        if self.lock().fail.metadata {
            return Err(ChainError::Transport("injected metadata failure".into()));
        }
        Ok(self.metadata.clone())
    }

    async fn storage_latest(&self, key: &StorageKey) -> Result<Option<Vec<u8>>, ChainError> {
        let state = self.lock();
        if state.fail.storage {
            return Err(ChainError::Transport("injected storage failure".into()));
        }
        Ok(state.storage.get(&key.0).cloned())
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let state = self.lock();
        if state.fail.rpc {
            return Err(ChainError::Transport("injected rpc failure".into()));
        }

        match method {
            "anchor_getAnchorById" => {
                let anchor_id = anchor_id_param(&params)?;
                let (doc_root, anchored_block) = state
                    .anchors
                    .get(&anchor_id)
                    .copied()
                    .unwrap_or((DocumentRoot::ZERO, 0));
                Ok(json!({
                    "id": format!("0x{}", hex::encode(anchor_id.as_bytes())),
                    "doc_root": format!("0x{}", hex::encode(doc_root.as_bytes())),
                    "anchored_block": anchored_block,
                }))
            }
            other => Err(ChainError::Transport(format!("unknown rpc method {other}"))),
        }
    }

    async fn submit_extrinsic(
        &self,
        _meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<(TxHash, BlockNumber, Signature), ChainError> {
        let signature = keyring.sign(&codec::encode(&call)?);
        let info = self.submit(call, *keyring.account_id())?;
        Ok((info.tx_hash, info.block_number, signature))
    }

    async fn submit_and_watch(
        &self,
        _meta: &Metadata,
        call: Call,
        keyring: &Keyring,
    ) -> Result<ExtrinsicInfo, ChainError> {
        self.submit(call, *keyring.account_id())
    }

    async fn block_hash(&self, number: BlockNumber) -> Result<BlockHash, ChainError> {
        self.lock()
            .block_hashes
            .get(number as usize)
            .copied()
            .ok_or(ChainError::BlockNotFound(number))
    }

    async fn block(&self, hash: &BlockHash) -> Result<Block, ChainError> {
        let state = self.lock();
        let position = state
            .block_hashes
            .iter()
            .position(|h| h == hash)
            .ok_or(ChainError::BlockHashUnknown(*hash))?;
        Ok(state.blocks[position].clone())
    }
}

/// The fixed runtime definition this chain serves as metadata.
fn runtime_metadata() -> Metadata {
    Metadata {
        pallets: vec![
            PalletMetadata {
                name: "System".into(),
                index: 0,
                calls: vec![],
                storage: vec!["Account".into()],
            },
            PalletMetadata {
                name: "Proxy".into(),
                index: 1,
                calls: vec!["proxy".into(), "add_proxy".into()],
                storage: vec!["Proxies".into()],
            },
            PalletMetadata {
                name: "Keystore".into(),
                index: 2,
                calls: vec!["add_keys".into(), "revoke_keys".into()],
                storage: vec!["Keys".into(), "LastKeyByPurpose".into()],
            },
            PalletMetadata {
                name: "Anchor".into(),
                index: 3,
                calls: vec!["pre_commit".into(), "commit".into()],
                storage: vec![],
            },
            PalletMetadata {
                name: "Timestamp".into(),
                index: 4,
                calls: vec!["set".into()],
                storage: vec![],
            },
        ],
    }
}

fn block_moment(number: BlockNumber) -> Timestamp {
    Timestamp::from_millis(GENESIS_TIME_MILLIS + number * BLOCK_INTERVAL_MILLIS)
}

fn push_block(state: &mut ChainState, meta: &Metadata, extrinsic: Option<Extrinsic>) -> BlockHash {
    let number = state.blocks.len() as BlockNumber;
    let moment = block_moment(number);

    let timestamp_set = Extrinsic {
        call: Call::new(meta, "Timestamp.set", &(moment.as_millis(),))
            .expect("runtime metadata contains Timestamp.set"),
        signer: None,
    };

    let mut extrinsics = vec![timestamp_set];
    extrinsics.extend(extrinsic);

    state.blocks.push(Block { number, extrinsics });
    let hash = BlockHash::new(blake2b_256(&number.to_le_bytes()));
    state.block_hashes.push(hash);
    hash
}

fn apply_call(
    state: &mut ChainState,
    meta: &Metadata,
    origin: AccountId,
    call: &Call,
    at_block: BlockNumber,
) -> Result<(), String> {
    match call_name(meta, call) {
        Some(("Proxy", "proxy")) => {
            let (delegator, forced, inner): (AccountId, Option<ProxyType>, Call) =
                call.decode_args().map_err(|e| e.to_string())?;

            let entry = read_proxies(state, meta, &delegator)?
                .ok_or_else(|| "delegator has no registered proxies".to_string())?;

            let authorized = entry.definitions.iter().any(|d| {
                d.delegate == origin
                    && match forced {
                        None => true,
                        Some(forced) => {
                            d.proxy_type == forced || d.proxy_type == ProxyType::Any
                        }
                    }
            });
            if !authorized {
                return Err("origin is not a registered proxy of the delegator".into());
            }

            apply_call(state, meta, delegator, &inner, at_block)
        }
        Some(("Proxy", "add_proxy")) => {
            let (delegate, proxy_type, delay): (AccountId, ProxyType, u32) =
                call.decode_args().map_err(|e| e.to_string())?;

            let mut entry = read_proxies(state, meta, &origin)?.unwrap_or_default();
            entry.definitions.push(ProxyDefinition {
                delegate,
                proxy_type,
                delay,
            });
            entry.deposit += PROXY_DEPOSIT;
            write_proxies(state, meta, &origin, &entry)
        }
        Some(("Keystore", "add_keys")) => {
            let (keys,): (Vec<AddKey>,) = call.decode_args().map_err(|e| e.to_string())?;

            for key in keys {
                let key_id = KeyId::new(key.key, key.purpose);
                let record = KeyRecord {
                    key_type: key.key_type,
                    purpose: key.purpose,
                    deposit: KEY_DEPOSIT,
                    revoked_at: None,
                };
                let storage_key = keys_storage_key(meta, &origin, &key_id)?;
                let value = codec::encode(&record).map_err(|e| e.to_string())?;
                state.storage.insert(storage_key.0, value);

                let last_key = last_key_storage_key(meta, &origin, key.purpose)?;
                let value = codec::encode(&key.key).map_err(|e| e.to_string())?;
                state.storage.insert(last_key.0, value);
            }
            Ok(())
        }
        Some(("Keystore", "revoke_keys")) => {
            let (hashes, purpose): (Vec<KeyHash>, KeyPurpose) =
                call.decode_args().map_err(|e| e.to_string())?;

            for hash in hashes {
                let key_id = KeyId::new(hash, purpose);
                let storage_key = keys_storage_key(meta, &origin, &key_id)?;
                let bytes = state
                    .storage
                    .get(&storage_key.0)
                    .ok_or_else(|| "key not found".to_string())?;
                let mut record: KeyRecord = codec::decode(bytes).map_err(|e| e.to_string())?;
                // Monotonic: a revocation height is set once, never moved.
                if record.revoked_at.is_none() {
                    record.revoked_at = Some(at_block);
                    let value = codec::encode(&record).map_err(|e| e.to_string())?;
                    state.storage.insert(storage_key.0, value);
                }
            }
            Ok(())
        }
        Some(("Anchor", "pre_commit")) => {
            let (anchor_id, signing_root): (AnchorId, DocumentRoot) =
                call.decode_args().map_err(|e| e.to_string())?;

            if state.pre_commits.contains_key(&anchor_id) || state.anchors.contains_key(&anchor_id)
            {
                return Err("anchor slot already claimed".into());
            }
            state.pre_commits.insert(anchor_id, signing_root);
            Ok(())
        }
        Some(("Anchor", "commit")) => {
            let (anchor_id, doc_root, proof, _expires_at): (
                AnchorId,
                DocumentRoot,
                [u8; 32],
                Timestamp,
            ) = call.decode_args().map_err(|e| e.to_string())?;

            if state.anchors.contains_key(&anchor_id) {
                return Err("anchor already committed".into());
            }
            if let Some(signing_root) = state.pre_commits.get(&anchor_id) {
                if combine_roots(signing_root, &proof) != doc_root {
                    return Err("pre-commit proof mismatch".into());
                }
            }
            state.pre_commits.remove(&anchor_id);
            state.anchors.insert(anchor_id, (doc_root, at_block));
            Ok(())
        }
        _ => Err("unknown call".into()),
    }
}

fn call_name<'a>(meta: &'a Metadata, call: &Call) -> Option<(&'a str, &'a str)> {
    let pallet = meta.pallets.iter().find(|p| p.index == call.index.pallet)?;
    let name = pallet.calls.get(call.index.call as usize)?;
    Some((pallet.name.as_str(), name.as_str()))
}

fn account_storage_key(meta: &Metadata, account: &AccountId) -> Result<StorageKey, String> {
    let encoded = codec::encode(account).map_err(|e| e.to_string())?;
    create_storage_key(meta, "System", "Account", &[&encoded]).map_err(|e| e.to_string())
}

fn proxies_storage_key(meta: &Metadata, account: &AccountId) -> Result<StorageKey, String> {
    let encoded = codec::encode(account).map_err(|e| e.to_string())?;
    create_storage_key(meta, "Proxy", "Proxies", &[&encoded]).map_err(|e| e.to_string())
}

fn keys_storage_key(
    meta: &Metadata,
    identity: &AccountId,
    key_id: &KeyId,
) -> Result<StorageKey, String> {
    let encoded_identity = codec::encode(identity).map_err(|e| e.to_string())?;
    let encoded_key_id = codec::encode(key_id).map_err(|e| e.to_string())?;
    create_storage_key(meta, "Keystore", "Keys", &[&encoded_identity, &encoded_key_id])
        .map_err(|e| e.to_string())
}

fn last_key_storage_key(
    meta: &Metadata,
    identity: &AccountId,
    purpose: KeyPurpose,
) -> Result<StorageKey, String> {
    let encoded_identity = codec::encode(identity).map_err(|e| e.to_string())?;
    let encoded_purpose = codec::encode(&purpose).map_err(|e| e.to_string())?;
    create_storage_key(
        meta,
        "Keystore",
        "LastKeyByPurpose",
        &[&encoded_identity, &encoded_purpose],
    )
    .map_err(|e| e.to_string())
}

fn read_proxies(
    state: &ChainState,
    meta: &Metadata,
    account: &AccountId,
) -> Result<Option<ProxyStorageEntry>, String> {
    let key = proxies_storage_key(meta, account)?;
    match state.storage.get(&key.0) {
        None => Ok(None),
        Some(bytes) => codec::decode(bytes).map(Some).map_err(|e| e.to_string()),
    }
}

fn write_proxies(
    state: &mut ChainState,
    meta: &Metadata,
    account: &AccountId,
    entry: &ProxyStorageEntry,
) -> Result<(), String> {
    let key = proxies_storage_key(meta, account)?;
    let value = codec::encode(entry).map_err(|e| e.to_string())?;
    state.storage.insert(key.0, value);
    Ok(())
}

fn anchor_id_param(params: &serde_json::Value) -> Result<AnchorId, ChainError> {
    let hex_id = params
        .get(0)
        .and_then(|p| p.as_str())
        .ok_or_else(|| ChainError::MalformedResponse("missing anchor id parameter".into()))?;
    let bytes = hex::decode(hex_id.trim_start_matches("0x"))
        .map_err(|e| ChainError::MalformedResponse(format!("invalid anchor id hex: {e}")))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ChainError::MalformedResponse("anchor id is not 32 bytes".into()))?;
    Ok(AnchorId::new(arr))
}

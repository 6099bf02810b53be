//! Storage key construction.

use crate::error::ChainError;
use crate::metadata::Metadata;
use mooring_crypto::blake2b_256;
use serde::{Deserialize, Serialize};

/// An opaque storage key: 16-byte pallet prefix, 16-byte item prefix, then
/// one 32-byte Blake2b hash per encoded map key part.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(pub Vec<u8>);

impl StorageKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Build the storage key for `pallet.item` with the given encoded map key
/// parts. Fails when the metadata does not know the pallet or item.
pub fn create_storage_key(
    meta: &Metadata,
    pallet: &str,
    item: &str,
    parts: &[&[u8]],
) -> Result<StorageKey, ChainError> {
    let pallet_meta = meta
        .pallet(pallet)
        .ok_or_else(|| ChainError::UnknownStorageItem(format!("{pallet}.{item}")))?;

    if !pallet_meta.storage.iter().any(|s| s == item) {
        return Err(ChainError::UnknownStorageItem(format!("{pallet}.{item}")));
    }

    let mut key = Vec::with_capacity(32 + 32 * parts.len());
    key.extend_from_slice(&blake2b_256(pallet.as_bytes())[..16]);
    key.extend_from_slice(&blake2b_256(item.as_bytes())[..16]);
    for part in parts {
        key.extend_from_slice(&blake2b_256(part));
    }

    Ok(StorageKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PalletMetadata;

    fn sample() -> Metadata {
        Metadata {
            pallets: vec![PalletMetadata {
                name: "Keystore".into(),
                index: 1,
                calls: vec![],
                storage: vec!["Keys".into(), "LastKeyByPurpose".into()],
            }],
        }
    }

    #[test]
    fn keys_are_prefixed_and_deterministic() {
        let meta = sample();
        let a = create_storage_key(&meta, "Keystore", "Keys", &[b"part"]).unwrap();
        let b = create_storage_key(&meta, "Keystore", "Keys", &[b"part"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), 32 + 32);
    }

    #[test]
    fn different_parts_produce_different_keys() {
        let meta = sample();
        let a = create_storage_key(&meta, "Keystore", "Keys", &[b"one"]).unwrap();
        let b = create_storage_key(&meta, "Keystore", "Keys", &[b"two"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn items_do_not_collide() {
        let meta = sample();
        let keys = create_storage_key(&meta, "Keystore", "Keys", &[]).unwrap();
        let last = create_storage_key(&meta, "Keystore", "LastKeyByPurpose", &[]).unwrap();
        assert_ne!(keys, last);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let meta = sample();
        assert!(matches!(
            create_storage_key(&meta, "Keystore", "Nope", &[]),
            Err(ChainError::UnknownStorageItem(_))
        ));
        assert!(matches!(
            create_storage_key(&meta, "System", "Account", &[]),
            Err(ChainError::UnknownStorageItem(_))
        ));
    }
}

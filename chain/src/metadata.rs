//! Runtime metadata: the pallet/call/storage name tables of the connected
//! chain, refreshed from the node on every operation that builds calls or
//! storage keys.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// Position of a call in the runtime dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallIndex {
    pub pallet: u8,
    pub call: u8,
}

/// Metadata of a single pallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletMetadata {
    pub name: String,
    pub index: u8,
    /// Call names in dispatch order.
    pub calls: Vec<String>,
    /// Storage item names.
    pub storage: Vec<String>,
}

/// Runtime metadata for the connected chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub pallets: Vec<PalletMetadata>,
}

impl Metadata {
    pub fn pallet(&self, name: &str) -> Option<&PalletMetadata> {
        self.pallets.iter().find(|p| p.name == name)
    }

    fn pallet_by_index(&self, index: u8) -> Option<&PalletMetadata> {
        self.pallets.iter().find(|p| p.index == index)
    }

    /// Resolve a `"Pallet.call"` path to its dispatch index.
    pub fn call_index(&self, path: &str) -> Result<CallIndex, ChainError> {
        let (pallet_name, call_name) = path
            .split_once('.')
            .ok_or_else(|| ChainError::UnknownCall(path.to_string()))?;

        let pallet = self
            .pallet(pallet_name)
            .ok_or_else(|| ChainError::UnknownCall(path.to_string()))?;

        let call = pallet
            .calls
            .iter()
            .position(|c| c == call_name)
            .ok_or_else(|| ChainError::UnknownCall(path.to_string()))?;

        Ok(CallIndex {
            pallet: pallet.index,
            call: call as u8,
        })
    }

    /// Whether a dispatch index is the timestamp pallet's `set` call, the
    /// inherent that stamps every block with its wall-clock moment.
    pub fn is_timestamp_set(&self, index: CallIndex) -> bool {
        let Some(pallet) = self.pallet_by_index(index.pallet) else {
            return false;
        };

        pallet.name == "Timestamp"
            && pallet.calls.get(index.call as usize).map(String::as_str) == Some("set")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metadata {
        Metadata {
            pallets: vec![
                PalletMetadata {
                    name: "Proxy".into(),
                    index: 0,
                    calls: vec!["proxy".into(), "add_proxy".into()],
                    storage: vec!["Proxies".into()],
                },
                PalletMetadata {
                    name: "Timestamp".into(),
                    index: 3,
                    calls: vec!["set".into()],
                    storage: vec![],
                },
            ],
        }
    }

    #[test]
    fn resolves_call_index() {
        let meta = sample();
        assert_eq!(
            meta.call_index("Proxy.add_proxy").unwrap(),
            CallIndex { pallet: 0, call: 1 }
        );
    }

    #[test]
    fn unknown_call_is_rejected() {
        let meta = sample();
        assert!(matches!(
            meta.call_index("Proxy.remove_proxy"),
            Err(ChainError::UnknownCall(_))
        ));
        assert!(matches!(
            meta.call_index("Balances.transfer"),
            Err(ChainError::UnknownCall(_))
        ));
        assert!(matches!(
            meta.call_index("no-dot"),
            Err(ChainError::UnknownCall(_))
        ));
    }

    #[test]
    fn timestamp_set_detection() {
        let meta = sample();
        let set = meta.call_index("Timestamp.set").unwrap();
        let proxy = meta.call_index("Proxy.proxy").unwrap();
        assert!(meta.is_timestamp_set(set));
        assert!(!meta.is_timestamp_set(proxy));
        assert!(!meta.is_timestamp_set(CallIndex { pallet: 9, call: 0 }));
    }
}

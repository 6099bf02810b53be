//! Runtime call construction.

use crate::codec;
use crate::error::ChainError;
use crate::metadata::{CallIndex, Metadata};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A dispatchable runtime call: an index into the dispatch table plus the
/// encoded argument tuple. Calls nest — `Proxy.proxy` carries another call
/// in its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub index: CallIndex,
    pub args: Vec<u8>,
}

impl Call {
    /// Build a call from a `"Pallet.call"` path and its argument tuple.
    pub fn new<T: Serialize + ?Sized>(
        meta: &Metadata,
        path: &str,
        args: &T,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            index: meta.call_index(path)?,
            args: codec::encode(args)?,
        })
    }

    /// Decode the argument tuple back out of the call.
    pub fn decode_args<T: DeserializeOwned>(&self) -> Result<T, ChainError> {
        codec::decode(&self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PalletMetadata;
    use mooring_types::AnchorId;

    fn sample() -> Metadata {
        Metadata {
            pallets: vec![PalletMetadata {
                name: "Anchor".into(),
                index: 2,
                calls: vec!["pre_commit".into(), "commit".into()],
                storage: vec![],
            }],
        }
    }

    #[test]
    fn args_roundtrip() {
        let meta = sample();
        let anchor_id = AnchorId::new([1u8; 32]);
        let call = Call::new(&meta, "Anchor.pre_commit", &(anchor_id, 7u64)).unwrap();
        let (id, n): (AnchorId, u64) = call.decode_args().unwrap();
        assert_eq!(id, anchor_id);
        assert_eq!(n, 7);
    }

    #[test]
    fn nested_call_roundtrips() {
        let meta = sample();
        let inner = Call::new(&meta, "Anchor.commit", &(3u32,)).unwrap();
        let outer = Call::new(&meta, "Anchor.pre_commit", &(inner.clone(),)).unwrap();
        let (decoded,): (Call,) = outer.decode_args().unwrap();
        assert_eq!(decoded, inner);
    }

    #[test]
    fn unknown_path_fails_before_encoding() {
        let meta = sample();
        assert!(matches!(
            Call::new(&meta, "Anchor.evict", &()),
            Err(ChainError::UnknownCall(_))
        ));
    }
}

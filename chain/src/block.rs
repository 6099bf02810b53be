//! Blocks, extrinsics, and inclusion receipts.

use crate::call::Call;
use crate::metadata::Metadata;
use mooring_types::{AccountId, BlockHash, BlockNumber, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

/// A call as included in a block, with its signer when it was signed
/// (inherents such as the timestamp set carry none).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extrinsic {
    pub call: Call,
    pub signer: Option<AccountId>,
}

/// A chain block, reduced to what this node consumes: its height and its
/// extrinsics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub extrinsics: Vec<Extrinsic>,
}

/// Receipt for an extrinsic watched until inclusion.
///
/// Opaque to everything above the chain layer: callers only ever treat it as
/// evidence of success, never interpret its fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrinsicInfo {
    pub tx_hash: TxHash,
    pub block_hash: BlockHash,
    pub block_number: BlockNumber,
    /// Index of the extrinsic within its block.
    pub index: u32,
}

/// Extract a block's wall-clock moment from its timestamp-set inherent.
///
/// Returns `None` when the block carries no such extrinsic or its argument
/// does not decode.
pub fn block_timestamp(meta: &Metadata, block: &Block) -> Option<Timestamp> {
    for extrinsic in &block.extrinsics {
        if meta.is_timestamp_set(extrinsic.call.index) {
            let (millis,): (u64,) = extrinsic.call.decode_args().ok()?;
            return Some(Timestamp::from_millis(millis));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PalletMetadata;

    fn meta() -> Metadata {
        Metadata {
            pallets: vec![
                PalletMetadata {
                    name: "Timestamp".into(),
                    index: 3,
                    calls: vec!["set".into()],
                    storage: vec![],
                },
                PalletMetadata {
                    name: "Anchor".into(),
                    index: 2,
                    calls: vec!["pre_commit".into()],
                    storage: vec![],
                },
            ],
        }
    }

    #[test]
    fn finds_timestamp_extrinsic() {
        let meta = meta();
        let block = Block {
            number: 9,
            extrinsics: vec![Extrinsic {
                call: Call::new(&meta, "Timestamp.set", &(1_700_000_000_000u64,)).unwrap(),
                signer: None,
            }],
        };
        assert_eq!(
            block_timestamp(&meta, &block),
            Some(Timestamp::from_millis(1_700_000_000_000))
        );
    }

    #[test]
    fn block_without_timestamp_yields_none() {
        let meta = meta();
        let block = Block {
            number: 9,
            extrinsics: vec![Extrinsic {
                call: Call::new(&meta, "Anchor.pre_commit", &()).unwrap(),
                signer: None,
            }],
        };
        assert_eq!(block_timestamp(&meta, &block), None);
    }
}

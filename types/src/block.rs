//! The per-request block unit served to wallets.

use bytes::Bytes;
use cuprate_epee_encoding::epee_object;

use crate::BlockHash;

/// A block blob together with the blobs of its non-coinbase
/// transactions, as carried inside `getblocks`-style responses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockCompleteEntry {
    /// Serialized block: header, miner transaction, tx hash list.
    pub block: Bytes,
    /// Raw transaction blobs, in in-block order.
    pub txs: Vec<Bytes>,
}

epee_object! {
    BlockCompleteEntry,
    block: Bytes,
    txs: Vec<Bytes>,
}

/// One wallet-block result.
///
/// Relevant blocks carry the full [`BlockCompleteEntry`] and the
/// global output indices of every transaction in it; irrelevant
/// blocks are skeletons, hash and timestamp only, present so the
/// client can keep extending its short chain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalletBlock {
    pub hash: BlockHash,
    pub timestamp: u64,
    pub block: Option<BlockCompleteEntry>,
    /// Per transaction (coinbase first), the global index of each of
    /// its outputs. Empty for skeletons.
    pub output_indices: Vec<Vec<u64>>,
}

impl WalletBlock {
    /// A hash-and-timestamp-only entry.
    pub fn skeleton(hash: BlockHash, timestamp: u64) -> Self {
        Self {
            hash,
            timestamp,
            block: None,
            output_indices: Vec::new(),
        }
    }
}

//! Row shapes returned by the store.

use fastsync_types::{BlockHash, Key};

/// A persisted block without its transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    pub height: u64,
    pub hash: BlockHash,
    /// Serialized block header.
    pub header: Vec<u8>,
    pub timestamp: u64,
}

/// A transaction with everything the scanner needs pre-extracted by
/// the indexer: one-time output keys, global output indices and the
/// inflated (absolute) input offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparsedTx {
    pub hash: BlockHash,
    pub blob: Vec<u8>,
    pub output_keys: Vec<Key>,
    pub output_indices: Vec<u64>,
    pub used_inputs: Vec<u64>,
}

/// A block plus all of its transactions (coinbase first), as fetched
/// for scan mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparsedBlock {
    pub entry: BlockEntry,
    pub txs: Vec<PreparsedTx>,
}

/// A transaction of an already-scanned relevant block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTx {
    pub hash: BlockHash,
    pub blob: Vec<u8>,
    pub output_indices: Vec<u64>,
}

/// A block from the per-wallet persisted range.
///
/// `relevant` is whether the wallet is tagged on the block; only
/// relevant blocks carry transactions, the rest collapse to
/// skeletons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBlock {
    pub entry: BlockEntry,
    pub relevant: bool,
    pub txs: Vec<SerializedTx>,
}

/// A wallet-owned output: its global index and the height it was
/// found at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputHeight {
    pub output: u64,
    pub height: u64,
}

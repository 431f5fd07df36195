use std::{cmp::min, collections::HashSet, io, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use monero_serai::{
    block::Block,
    transaction::{NotPruned, Transaction},
};
use tracing::{debug, warn};

use fastsync_storage::{
    BlockEntry, OutputHeight, PreparsedBlock, StoreError, TaggedBlock, WalletStore,
};
use fastsync_types::{
    io::write_varint, BlockCompleteEntry, BlockHash, Key, WalletBlock, WalletEntry, WalletKeys,
};

use crate::{
    crypto::{decompress, derive_output_key, key_derivation},
    extra::extra_pub_keys,
};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The spend public key is not a point on the curve.
    #[error("wallet spend key is not a valid curve point")]
    InvalidWalletKeys,
    /// A persisted block did not reassemble into a parseable block.
    #[error("malformed block {0}: {1}")]
    MalformedBlock(String, io::Error),
    /// A persisted transaction blob failed to parse. Distinct from a
    /// tx-extra failure, which only skips the transaction.
    #[error("malformed transaction {0}: {1}")]
    MalformedTransaction(String, io::Error),
}

/// Produces wallet-block results; implemented by [`BlockScanner`]
/// and by test doubles in the queue's tests.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Up to `max_blocks` results starting at `start_height`.
    ///
    /// Consults the cache for heights the wallet has already been
    /// scanned to and scans fresh blocks past that, persisting what
    /// it finds. Stateless across calls.
    async fn get_blocks(
        &self,
        start_height: u64,
        wallet: WalletEntry,
        max_blocks: usize,
    ) -> Result<Vec<WalletBlock>, ScanError>;
}

/// The production scanner over a [`WalletStore`].
pub struct BlockScanner {
    store: Arc<dyn WalletStore>,
}

impl BlockScanner {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Cache-hit mode: expand the per-wallet persisted range.
    async fn processed_blocks(
        &self,
        wallet_id: i32,
        start_height: u64,
        max_blocks: usize,
    ) -> Result<Vec<WalletBlock>, ScanError> {
        let blocks = self
            .store
            .wallet_blocks(wallet_id, start_height, max_blocks)
            .await?;

        blocks.iter().map(tagged_to_wallet_block).collect()
    }

    /// Scan mode: test fresh blocks against the wallet keys and
    /// persist what was found.
    async fn scan_wallet_blocks(
        &self,
        wallet: &WalletEntry,
        start_height: u64,
        max_count: usize,
    ) -> Result<ScanOutcome, ScanError> {
        // The result must include the block at `start_height`, but
        // bookkeeping has to continue from wherever the last scan
        // stopped.
        let scan_from = min(wallet.scanned_height + 1, start_height);

        let outs = self.store.wallet_outputs(wallet.id).await?;
        debug!(wallet = wallet.id, outputs = outs.len(), "loaded owned outputs");

        let blocks = self.store.blocks_above(scan_from, max_count).await?;
        debug!(scan_from, count = blocks.len(), "retrieved blocks to scan");

        let mut tx_scanner = TxScanner::new(&wallet.keys, &outs)?;

        let mut last_checked = None;
        let mut relevant_hashes: Vec<BlockHash> = Vec::new();
        let mut found_blocks = Vec::with_capacity(max_count);

        for block in &blocks {
            let mut found = false;

            for tx in &block.txs {
                let parsed = Transaction::<NotPruned>::read(&mut tx.blob.as_slice()).map_err(|e| {
                    ScanError::MalformedTransaction(hex::encode(tx.hash), e)
                })?;

                let pub_keys = match extra_pub_keys(&parsed.prefix().extra) {
                    Ok(keys) => keys,
                    Err(e) => {
                        // Extra is not consensus-critical, skip the tx.
                        warn!(tx = %hex::encode(tx.hash), "failed to parse tx-extra: {e}");
                        continue;
                    }
                };

                if tx_scanner.search_outputs(
                    block.entry.height,
                    &pub_keys,
                    &tx.output_keys,
                    &tx.output_indices,
                ) {
                    found = true;
                }

                if tx_scanner.search_mixins(&tx.used_inputs) {
                    found = true;
                }
            }

            last_checked = Some(block.entry.hash);

            if found {
                relevant_hashes.push(block.entry.hash);
            }

            if block.entry.height >= start_height {
                if found {
                    found_blocks.push(preparsed_to_wallet_block(block)?);
                } else {
                    found_blocks.push(WalletBlock::skeleton(
                        block.entry.hash,
                        block.entry.timestamp,
                    ));
                }
            }
        }

        if !relevant_hashes.is_empty() {
            self.store
                .save_wallet_blocks(wallet.id, &relevant_hashes, &tx_scanner.new_outputs)
                .await?;
        }

        Ok(ScanOutcome {
            blocks: found_blocks,
            last_checked,
        })
    }
}

#[async_trait]
impl Scanner for BlockScanner {
    async fn get_blocks(
        &self,
        start_height: u64,
        wallet: WalletEntry,
        max_blocks: usize,
    ) -> Result<Vec<WalletBlock>, ScanError> {
        debug!(
            start_height,
            scanned = wallet.scanned_height,
            "requested blocks"
        );

        if wallet.scanned_height >= start_height {
            // Inclusive of the start height.
            let known = (wallet.scanned_height - start_height + 1) as usize;
            let blocks = self
                .processed_blocks(wallet.id, start_height, min(max_blocks, known))
                .await?;

            debug!(count = blocks.len(), "served blocks from cache");
            return Ok(blocks);
        }

        let outcome = self
            .scan_wallet_blocks(&wallet, start_height, max_blocks)
            .await?;

        if let Some(last_checked) = outcome.last_checked {
            if let Err(e) = self.store.save_wallet_progress(wallet.id, last_checked).await {
                // Most likely a chain split purged the block; the next
                // scan retries from the stale cursor, which is safe
                // because output writes are idempotent.
                warn!(wallet = wallet.id, "failed to save wallet progress: {e}");
            }
        }

        debug!(count = outcome.blocks.len(), "scanned blocks");
        Ok(outcome.blocks)
    }
}

struct ScanOutcome {
    blocks: Vec<WalletBlock>,
    /// Hash of the last block whose scan completed, `None` when the
    /// window was already past the chain tip.
    last_checked: Option<BlockHash>,
}

/// Matches transactions against one wallet during a scan batch.
struct TxScanner {
    view_secret: Scalar,
    spend_public: EdwardsPoint,
    owned: HashSet<u64>,
    new_outputs: Vec<OutputHeight>,
}

impl TxScanner {
    fn new(keys: &WalletKeys, outs: &[OutputHeight]) -> Result<Self, ScanError> {
        Ok(Self {
            view_secret: Scalar::from_bytes_mod_order(keys.view_secret),
            spend_public: decompress(&keys.spend_public).ok_or(ScanError::InvalidWalletKeys)?,
            owned: outs.iter().map(|o| o.output).collect(),
            new_outputs: Vec::new(),
        })
    }

    /// Test every output of a transaction against every ephemeral key
    /// it carries; record hits as newly owned outputs.
    fn search_outputs(
        &mut self,
        height: u64,
        tx_pub_keys: &[Key],
        output_keys: &[Key],
        global_indices: &[u64],
    ) -> bool {
        let mut found = false;

        for pub_key in tx_pub_keys {
            // Not a curve point: nothing can be derived from it.
            let Some(point) = decompress(pub_key) else {
                continue;
            };
            let derivation = key_derivation(&self.view_secret, &point);

            for (i, out_key) in output_keys.iter().enumerate() {
                let Some(&global) = global_indices.get(i) else {
                    continue;
                };

                if derive_output_key(&derivation, i as u64, &self.spend_public) == *out_key {
                    self.new_outputs.push(OutputHeight {
                        output: global,
                        height,
                    });
                    self.owned.insert(global);
                    found = true;
                }
            }
        }

        found
    }

    /// Whether any input references an output we own, as the real
    /// spend or as a decoy.
    fn search_mixins(&self, inputs: &[u64]) -> bool {
        inputs.iter().any(|i| self.owned.contains(i))
    }
}

fn tagged_to_wallet_block(block: &TaggedBlock) -> Result<WalletBlock, ScanError> {
    if !block.relevant || block.txs.is_empty() {
        return Ok(WalletBlock::skeleton(
            block.entry.hash,
            block.entry.timestamp,
        ));
    }

    let txs: Vec<(BlockHash, &[u8], &[u64])> = block
        .txs
        .iter()
        .map(|tx| (tx.hash, tx.blob.as_slice(), tx.output_indices.as_slice()))
        .collect();

    complete_wallet_block(&block.entry, &txs)
}

fn preparsed_to_wallet_block(block: &PreparsedBlock) -> Result<WalletBlock, ScanError> {
    let txs: Vec<(BlockHash, &[u8], &[u64])> = block
        .txs
        .iter()
        .map(|tx| (tx.hash, tx.blob.as_slice(), tx.output_indices.as_slice()))
        .collect();

    complete_wallet_block(&block.entry, &txs)
}

/// Assemble the full block-complete entry for a relevant block:
/// header ‖ miner tx ‖ varint(tx count) ‖ tx hashes, with the
/// non-coinbase blobs alongside and per-tx output indices.
///
/// `txs` is every transaction of the block in order, coinbase first.
fn complete_wallet_block(
    entry: &BlockEntry,
    txs: &[(BlockHash, &[u8], &[u64])],
) -> Result<WalletBlock, ScanError> {
    let (&(_, miner_blob, miner_indices), rest) = txs.split_first().ok_or_else(|| {
        ScanError::MalformedBlock(
            hex::encode(entry.hash),
            io::Error::other("block has no transactions"),
        )
    })?;

    let mut block_blob = entry.header.clone();
    block_blob.extend_from_slice(miner_blob);
    write_varint(rest.len() as u64, &mut block_blob);
    for (hash, _, _) in rest {
        block_blob.extend_from_slice(hash);
    }

    // What we hand out has to be a parseable block, header and miner
    // tx included.
    let block = Block::read(&mut block_blob.as_slice())
        .map_err(|e| ScanError::MalformedBlock(hex::encode(entry.hash), e))?;

    let mut output_indices = Vec::with_capacity(txs.len());
    output_indices.push(miner_indices.to_vec());

    let mut tx_blobs = Vec::with_capacity(rest.len());
    for (_, blob, indices) in rest {
        tx_blobs.push(Bytes::copy_from_slice(blob));
        output_indices.push(indices.to_vec());
    }

    Ok(WalletBlock {
        hash: entry.hash,
        timestamp: block.header.timestamp,
        block: Some(BlockCompleteEntry {
            block: Bytes::from(block_blob),
            txs: tx_blobs,
        }),
        output_indices,
    })
}

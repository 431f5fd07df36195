//! An in-memory stand-in for the PostgreSQL store.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use fastsync_storage::{
    BlockEntry, OutputHeight, PreparsedBlock, SerializedTx, StoreError, TaggedBlock, WalletStore,
};
use fastsync_types::{AccountInfo, BlockHash, HeightInfo, WalletEntry, WalletKeys};

struct StoredWallet {
    id: i32,
    keys: WalletKeys,
    last_checked: Option<BlockHash>,
}

#[derive(Default)]
struct Tables {
    /// Sorted by height, gapless from the first entry.
    blocks: Vec<PreparsedBlock>,
    wallets: Vec<StoredWallet>,
    wallet_blocks: HashSet<(i32, BlockHash)>,
    /// Unique on (wallet, output), as the schema demands.
    wallet_outputs: HashMap<i32, HashMap<u64, u64>>,
}

/// The whole store behind one lock; plenty for tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new(blocks: Vec<PreparsedBlock>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                blocks,
                ..Default::default()
            }),
        }
    }

    /// Append a block, as the indexer would.
    pub fn push_block(&self, block: PreparsedBlock) {
        self.tables.lock().unwrap().blocks.push(block);
    }

    /// Drop all blocks at `height` and above, the way the indexer
    /// handles a reorganization: scan cursors above the split are
    /// repointed at the last surviving block, tagged blocks and
    /// recorded outputs above it are deleted.
    pub fn purge_from(&self, height: u64) {
        let mut tables = self.tables.lock().unwrap();

        let purged: HashSet<BlockHash> = tables
            .blocks
            .iter()
            .filter(|b| b.entry.height >= height)
            .map(|b| b.entry.hash)
            .collect();
        let split = tables
            .blocks
            .iter()
            .find(|b| height > 0 && b.entry.height == height - 1)
            .map(|b| b.entry.hash);

        for wallet in &mut tables.wallets {
            if wallet.last_checked.is_some_and(|h| purged.contains(&h)) {
                wallet.last_checked = split;
            }
        }

        tables.blocks.retain(|b| b.entry.height < height);
        tables
            .wallet_blocks
            .retain(|(_, hash)| !purged.contains(hash));
        for outputs in tables.wallet_outputs.values_mut() {
            outputs.retain(|_, found_at| *found_at < height);
        }
    }

    /// The owned outputs recorded for `wallet_id`, sorted by global
    /// index.
    pub fn outputs_of(&self, wallet_id: i32) -> Vec<OutputHeight> {
        let tables = self.tables.lock().unwrap();

        let mut outputs: Vec<OutputHeight> = tables
            .wallet_outputs
            .get(&wallet_id)
            .map(|outs| {
                outs.iter()
                    .map(|(&output, &height)| OutputHeight { output, height })
                    .collect()
            })
            .unwrap_or_default();
        outputs.sort_by_key(|o| o.output);
        outputs
    }

    /// Hashes of the blocks tagged relevant for `wallet_id`.
    pub fn tagged_blocks_of(&self, wallet_id: i32) -> Vec<BlockHash> {
        let tables = self.tables.lock().unwrap();

        let mut hashes: Vec<(u64, BlockHash)> = tables
            .blocks
            .iter()
            .filter(|b| tables.wallet_blocks.contains(&(wallet_id, b.entry.hash)))
            .map(|b| (b.entry.height, b.entry.hash))
            .collect();
        hashes.sort_by_key(|(height, _)| *height);
        hashes.into_iter().map(|(_, hash)| hash).collect()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn chain_intersection(&self, chain: &[BlockHash]) -> Result<HeightInfo, StoreError> {
        let tables = self.tables.lock().unwrap();

        tables
            .blocks
            .iter()
            .filter(|b| chain.contains(&b.entry.hash))
            .max_by_key(|b| b.entry.height)
            .map(|b| HeightInfo {
                height: b.entry.height,
                hash: b.entry.hash,
            })
            .ok_or(StoreError::ChainDisjoint)
    }

    async fn top_block_height(&self) -> Result<u64, StoreError> {
        let tables = self.tables.lock().unwrap();

        tables
            .blocks
            .iter()
            .map(|b| b.entry.height)
            .max()
            .ok_or(StoreError::MissingBlock(0))
    }

    async fn block_entry(&self, height: u64) -> Result<BlockEntry, StoreError> {
        let tables = self.tables.lock().unwrap();

        tables
            .blocks
            .iter()
            .find(|b| b.entry.height == height)
            .map(|b| b.entry.clone())
            .ok_or(StoreError::MissingBlock(height))
    }

    async fn blocks_above(
        &self,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<PreparsedBlock>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let end = start_height + max_count as u64;

        let mut blocks: Vec<PreparsedBlock> = tables
            .blocks
            .iter()
            .filter(|b| b.entry.height >= start_height && b.entry.height < end)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.entry.height);
        Ok(blocks)
    }

    async fn wallet_blocks(
        &self,
        wallet_id: i32,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<TaggedBlock>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let end = start_height + max_count as u64;

        let mut blocks: Vec<TaggedBlock> = tables
            .blocks
            .iter()
            .filter(|b| b.entry.height >= start_height && b.entry.height < end)
            .map(|b| {
                let relevant = tables.wallet_blocks.contains(&(wallet_id, b.entry.hash));
                TaggedBlock {
                    entry: b.entry.clone(),
                    relevant,
                    txs: if relevant {
                        b.txs
                            .iter()
                            .map(|tx| SerializedTx {
                                hash: tx.hash,
                                blob: tx.blob.clone(),
                                output_indices: tx.output_indices.clone(),
                            })
                            .collect()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();
        blocks.sort_by_key(|b| b.entry.height);
        Ok(blocks)
    }

    async fn wallet_outputs(&self, wallet_id: i32) -> Result<Vec<OutputHeight>, StoreError> {
        Ok(self.outputs_of(wallet_id))
    }

    async fn save_wallet_blocks(
        &self,
        wallet_id: i32,
        blocks: &[BlockHash],
        outputs: &[OutputHeight],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();

        // Only hashes that exist get tagged, like the INSERT..SELECT.
        let known: HashSet<BlockHash> = tables.blocks.iter().map(|b| b.entry.hash).collect();
        for hash in blocks.iter().filter(|h| known.contains(*h)) {
            tables.wallet_blocks.insert((wallet_id, *hash));
        }

        let owned = tables.wallet_outputs.entry(wallet_id).or_default();
        for output in outputs {
            owned.entry(output.output).or_insert(output.height);
        }

        Ok(())
    }

    async fn save_wallet_progress(
        &self,
        wallet_id: i32,
        hash: BlockHash,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();

        if !tables.blocks.iter().any(|b| b.entry.hash == hash) {
            return Err(StoreError::MissingBlock(0));
        }

        let wallet = tables
            .wallets
            .iter_mut()
            .find(|w| w.id == wallet_id)
            .ok_or(StoreError::CorruptRow(format!("no wallet {wallet_id}")))?;
        wallet.last_checked = Some(hash);
        Ok(())
    }

    async fn top_scanned_height(&self, wallet_id: i32) -> Result<HeightInfo, StoreError> {
        let tables = self.tables.lock().unwrap();

        let wallet = tables
            .wallets
            .iter()
            .find(|w| w.id == wallet_id)
            .ok_or(StoreError::CorruptRow(format!("no wallet {wallet_id}")))?;

        let hash = wallet
            .last_checked
            .ok_or(StoreError::CorruptRow(format!(
                "wallet {wallet_id} has no scan cursor"
            )))?;

        let block = tables
            .blocks
            .iter()
            .find(|b| b.entry.hash == hash)
            .ok_or(StoreError::MissingBlock(0))?;

        Ok(HeightInfo {
            height: block.entry.height,
            hash,
        })
    }

    async fn get_or_create_wallet(&self, account: AccountInfo) -> Result<WalletEntry, StoreError> {
        let mut tables = self.tables.lock().unwrap();

        if let Some(wallet) = tables.wallets.iter().find(|w| w.keys == account.keys) {
            let scanned_height = wallet
                .last_checked
                .and_then(|hash| {
                    tables
                        .blocks
                        .iter()
                        .find(|b| b.entry.hash == hash)
                        .map(|b| b.entry.height)
                })
                .unwrap_or(account.created_at);

            return Ok(WalletEntry {
                id: wallet.id,
                keys: account.keys,
                scanned_height,
            });
        }

        let created_at_block = tables
            .blocks
            .iter()
            .find(|b| b.entry.height == account.created_at)
            .map(|b| b.entry.hash)
            .ok_or(StoreError::MissingBlock(account.created_at))?;

        let id = tables.wallets.len() as i32 + 1;
        tables.wallets.push(StoredWallet {
            id,
            keys: account.keys,
            last_checked: Some(created_at_block),
        });

        Ok(WalletEntry {
            id,
            keys: account.keys,
            scanned_height: account.created_at,
        })
    }
}

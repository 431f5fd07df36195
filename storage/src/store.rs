use async_trait::async_trait;

use fastsync_types::{AccountInfo, BlockHash, HeightInfo, WalletEntry};

use crate::{
    error::StoreError,
    types::{BlockEntry, OutputHeight, PreparsedBlock, TaggedBlock},
};

/// The block store gateway.
///
/// One implementation talks to PostgreSQL; tests swap in an
/// in-memory one. All methods are safe to call concurrently.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// The highest persisted block whose hash appears in `chain`.
    ///
    /// Returns [`StoreError::ChainDisjoint`] when no hash matches,
    /// i.e. the client is on a fork we know nothing about.
    async fn chain_intersection(&self, chain: &[BlockHash]) -> Result<HeightInfo, StoreError>;

    /// Height of the chain tip.
    async fn top_block_height(&self) -> Result<u64, StoreError>;

    /// The persisted block at `height`.
    async fn block_entry(&self, height: u64) -> Result<BlockEntry, StoreError>;

    /// Up to `max_count` consecutive blocks starting at
    /// `start_height`, each with all transactions in block order.
    /// Shorter only if the chain ends; never a gap.
    async fn blocks_above(
        &self,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<PreparsedBlock>, StoreError>;

    /// The per-wallet view of up to `max_count` blocks starting at
    /// `start_height`: relevant blocks carry their transactions,
    /// irrelevant ones are bare entries.
    async fn wallet_blocks(
        &self,
        wallet_id: i32,
        start_height: u64,
        max_count: usize,
    ) -> Result<Vec<TaggedBlock>, StoreError>;

    /// Every output owned by the wallet.
    async fn wallet_outputs(&self, wallet_id: i32) -> Result<Vec<OutputHeight>, StoreError>;

    /// Atomically tag `blocks` as relevant to the wallet and record
    /// `outputs` as owned by it. Re-recording either is a no-op.
    async fn save_wallet_blocks(
        &self,
        wallet_id: i32,
        blocks: &[BlockHash],
        outputs: &[OutputHeight],
    ) -> Result<(), StoreError>;

    /// Move the wallet's scan cursor to the block with `hash`.
    async fn save_wallet_progress(
        &self,
        wallet_id: i32,
        hash: BlockHash,
    ) -> Result<(), StoreError>;

    /// Where the wallet's scan cursor currently points.
    async fn top_scanned_height(&self, wallet_id: i32) -> Result<HeightInfo, StoreError>;

    /// Look the wallet up by key pair, creating it with its cursor at
    /// the account's created-at height on first sight.
    async fn get_or_create_wallet(&self, account: AccountInfo) -> Result<WalletEntry, StoreError>;
}

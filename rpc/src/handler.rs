//! The `/fastsync.bin` request handler.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use fastsync_queue::JobsQueue;
use fastsync_scanner::crypto::decompress;
use fastsync_storage::WalletStore;
use fastsync_types::{AccountInfo, WalletKeys};

use crate::types::{
    BlockOutputIndices, WalletBlockInfo, WalletBlocksResult, WalletChainInfo, WalletKeysInfo,
};

/// What a failed request reveals to the client. Details go to the
/// log; the wire carries only the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The client sent something malformed; maps to HTTP 400.
    #[error("request error")]
    Request,
    /// The store or the scanner failed; maps to HTTP 500.
    #[error("internal error")]
    Internal,
}

/// Turns a validated request into a slice of wallet blocks by
/// binding the wallet to its scan job and waiting on it.
pub struct BlocksHandler {
    store: Arc<dyn WalletStore>,
    queue: Arc<JobsQueue>,
}

impl BlocksHandler {
    pub fn new(store: Arc<dyn WalletStore>, queue: Arc<JobsQueue>) -> Self {
        Self { store, queue }
    }

    pub async fn get_blocks(
        &self,
        request: &WalletChainInfo,
    ) -> Result<WalletBlocksResult, HandlerError> {
        let account = validate_keys(&request.keys)?;

        let Some(chain) = request.short_chain_hashes() else {
            error!("empty or malformed short chain");
            return Err(HandlerError::Request);
        };

        let common = self.store.chain_intersection(&chain).await.map_err(|e| {
            error!("failed to get common block: {e}");
            HandlerError::Internal
        })?;

        let entry = self.store.get_or_create_wallet(account).await.map_err(|e| {
            error!("failed to get wallet progress: {e}");
            HandlerError::Internal
        })?;

        debug!(
            wallet = entry.id,
            start = common.height,
            scanned = entry.scanned_height,
            "serving wallet request"
        );

        let listener = self.queue.add_job(entry, common.height);
        let blocks = listener.wait().await.map_err(|e| {
            error!("error while processing wallet blocks: {e}");
            HandlerError::Internal
        })?;

        debug!(count = blocks.len(), "processed blocks");

        let total_height = self.store.top_block_height().await.map_err(|e| {
            error!("error while getting top block height: {e}");
            HandlerError::Internal
        })?;

        Ok(WalletBlocksResult {
            start_height: common.height,
            total_height,
            blocks: blocks
                .iter()
                .map(|b| WalletBlockInfo {
                    hash: b.hash,
                    timestamp: b.timestamp,
                    block: b.block.clone().unwrap_or_default(),
                    output_indices: BlockOutputIndices::from_indices(&b.output_indices),
                })
                .collect(),
        })
    }
}

/// Exactly one syntactically valid key pair, or a client error.
fn validate_keys(keys: &[WalletKeysInfo]) -> Result<AccountInfo, HandlerError> {
    let [info] = keys else {
        if keys.is_empty() {
            error!("empty keys");
        } else {
            error!("more than one key is not supported yet");
        }
        return Err(HandlerError::Request);
    };

    // The scanner needs the spend key as a point; reject junk here
    // instead of failing the job later.
    if decompress(&info.spend_public_key).is_none() {
        error!("spend public key is not a valid curve point");
        return Err(HandlerError::Request);
    }

    Ok(AccountInfo {
        keys: WalletKeys {
            view_secret: info.view_secret_key,
            spend_public: info.spend_public_key,
        },
        created_at: info.created_at,
    })
}

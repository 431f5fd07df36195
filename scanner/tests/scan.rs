//! End-to-end scanner behaviour over a synthetic chain.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use fastsync_scanner::{BlockScanner, Scanner};
use fastsync_storage::{OutputHeight, WalletStore};
use fastsync_test_utils::{ChainBuilder, MemoryStore, TestWallet};
use fastsync_types::WalletEntry;

/// Ten blocks, a payment to the wallet buried at height 5.
fn chain_with_deposit(wallet: &TestWallet) -> (MemoryStore, u64) {
    let mut builder = ChainBuilder::new();
    builder.extend_empty(5);
    let global = builder.add_block_paying(wallet);
    builder.extend_empty(4);
    (builder.into_store(), global)
}

async fn resolve(store: &MemoryStore, wallet: &TestWallet) -> WalletEntry {
    store.get_or_create_wallet(wallet.account(0)).await.unwrap()
}

#[tokio::test]
async fn scan_finds_single_deposit() {
    let wallet = TestWallet::from_seed(1);
    let (store, global) = chain_with_deposit(&wallet);
    let store = Arc::new(store);
    let scanner = BlockScanner::new(store.clone());

    // A fresh wallet's cursor sits at its created-at block, so the
    // request starts right above it.
    let entry = resolve(&store, &wallet).await;
    let blocks = scanner.get_blocks(1, entry, 10).await.unwrap();

    assert_eq!(blocks.len(), 9);
    for (i, block) in blocks.iter().enumerate() {
        let height = i as u64 + 1;
        let expected = store.block_entry(height).await.unwrap();
        assert_eq!(block.hash, expected.hash);
        assert_eq!(block.timestamp, expected.timestamp);

        if height == 5 {
            let bce = block.block.as_ref().expect("deposit block is full");
            assert!(!bce.block.is_empty());
            // One non-coinbase transaction rides along.
            assert_eq!(bce.txs.len(), 1);
            // Output indices per tx: [coinbase], [decoy, deposit].
            assert_eq!(block.output_indices.len(), 2);
            assert_eq!(block.output_indices[1], vec![global - 1, global]);
        } else {
            assert_eq!(block.block, None);
            assert_eq!(block.output_indices, Vec::<Vec<u64>>::new());
        }
    }

    // The found output and the relevant block were persisted, and the
    // cursor moved to the last scanned block.
    assert_eq!(
        store.outputs_of(entry.id),
        vec![OutputHeight {
            output: global,
            height: 5
        }]
    );
    assert_eq!(store.tagged_blocks_of(entry.id).len(), 1);
    assert_eq!(store.top_scanned_height(entry.id).await.unwrap().height, 9);
}

#[tokio::test]
async fn spending_a_known_output_marks_the_block() {
    let wallet = TestWallet::from_seed(2);

    let mut builder = ChainBuilder::new();
    builder.extend_empty(5);
    let global = builder.add_block_paying(&wallet);
    builder.extend_empty(2);
    builder.add_block_spending(&[1, global]);
    builder.extend_empty(1);
    let store = Arc::new(builder.into_store());
    let scanner = BlockScanner::new(store.clone());

    // First pass up to the deposit only.
    let entry = resolve(&store, &wallet).await;
    scanner.get_blocks(1, entry, 5).await.unwrap();
    assert_eq!(store.outputs_of(entry.id).len(), 1);

    // Second pass over the rest: the mixin spend at height 8 is
    // recognised purely through the owned-output set.
    let entry = resolve(&store, &wallet).await;
    assert_eq!(entry.scanned_height, 5);
    let blocks = scanner.get_blocks(6, entry, 10).await.unwrap();

    assert_eq!(blocks.len(), 4);
    assert!(blocks[2].block.is_some(), "spend block must be full");
    assert!(blocks[0].block.is_none());
    assert!(blocks[3].block.is_none());

    // No new outputs were recorded, but the block was tagged.
    assert_eq!(store.outputs_of(entry.id).len(), 1);
    assert_eq!(store.tagged_blocks_of(entry.id).len(), 2);
}

#[tokio::test]
async fn cache_hit_replays_the_scan() {
    let wallet = TestWallet::from_seed(3);
    let (store, _) = chain_with_deposit(&wallet);
    let store = Arc::new(store);
    let scanner = BlockScanner::new(store.clone());

    let entry = resolve(&store, &wallet).await;
    let scanned = scanner.get_blocks(1, entry, 10).await.unwrap();

    // Same wallet again, starting a little below the deposit: served
    // from the persisted cache, bit-identical to the scan.
    let entry = resolve(&store, &wallet).await;
    assert_eq!(entry.scanned_height, 9);
    let cached = scanner.get_blocks(3, entry, 10).await.unwrap();

    // `scanned` covers heights 1..=9, so height 3 sits at index 2.
    assert_eq!(cached, scanned[2..].to_vec());

    // Replaying wrote nothing new.
    assert_eq!(store.outputs_of(entry.id).len(), 1);
    assert_eq!(store.tagged_blocks_of(entry.id).len(), 1);
}

#[tokio::test]
async fn malformed_extra_skips_the_transaction() {
    let wallet = TestWallet::from_seed(4);

    let mut builder = ChainBuilder::new();
    builder.extend_empty(3);
    builder.add_block_paying_bad_extra(&wallet);
    builder.extend_empty(2);
    let store = Arc::new(builder.into_store());
    let scanner = BlockScanner::new(store.clone());

    let entry = resolve(&store, &wallet).await;
    let blocks = scanner.get_blocks(1, entry, 10).await.unwrap();

    // The scan completes, the undecodable payment is just not found.
    assert_eq!(blocks.len(), 5);
    assert!(blocks.iter().all(|b| b.block.is_none()));
    assert_eq!(store.outputs_of(entry.id), vec![]);
}

#[tokio::test]
async fn blocks_below_the_request_are_bookkept_but_not_returned() {
    let wallet = TestWallet::from_seed(5);

    let mut builder = ChainBuilder::new();
    builder.extend_empty(3);
    let global = builder.add_block_paying(&wallet);
    builder.extend_empty(6);
    let store = Arc::new(builder.into_store());
    let scanner = BlockScanner::new(store.clone());

    // Request starts well past the deposit; the scanner still has to
    // catch up from the cursor underneath it.
    let entry = resolve(&store, &wallet).await;
    let blocks = scanner.get_blocks(6, entry, 10).await.unwrap();

    assert_eq!(blocks.len(), 4);
    assert!(blocks.iter().all(|b| b.block.is_none()));
    assert_eq!(blocks[0].hash, store.block_entry(6).await.unwrap().hash);

    assert_eq!(
        store.outputs_of(entry.id),
        vec![OutputHeight {
            output: global,
            height: 3
        }]
    );
}

//! Deterministic synthetic chains with outputs that really scan.

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha3::{Digest, Keccak256};

use fastsync_storage::{BlockEntry, PreparsedBlock, PreparsedTx};
use fastsync_types::{io::write_varint, AccountInfo, BlockHash, Key, WalletKeys};

use crate::MemoryStore;

// CryptoNote wire tags, as written into synthetic blobs.
const TXIN_GEN: u8 = 0xff;
const TXIN_TO_KEY: u8 = 0x02;
const TXOUT_TO_KEY: u8 = 0x02;
const EXTRA_PUB_KEY: u8 = 0x01;

/// A wallet with a known view key pair, for constructing deposits.
pub struct TestWallet {
    view_secret: Scalar,
    view_public: EdwardsPoint,
    spend_public: EdwardsPoint,
}

impl TestWallet {
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let view_secret = Scalar::from_bytes_mod_order(rng.gen());
        let spend_secret = Scalar::from_bytes_mod_order(rng.gen());

        Self {
            view_secret,
            view_public: EdwardsPoint::mul_base(&view_secret),
            spend_public: EdwardsPoint::mul_base(&spend_secret),
        }
    }

    pub fn keys(&self) -> WalletKeys {
        WalletKeys {
            view_secret: self.view_secret.to_bytes(),
            spend_public: self.spend_public.compress().to_bytes(),
        }
    }

    pub fn account(&self, created_at: u64) -> AccountInfo {
        AccountInfo {
            keys: self.keys(),
            created_at,
        }
    }
}

/// Builds a gapless chain from height 0, assigning global output
/// indices in chain order like the indexer does.
pub struct ChainBuilder {
    rng: StdRng,
    blocks: Vec<PreparsedBlock>,
    next_global: u64,
    /// Global indices of coinbase outputs; safe decoy material since
    /// the builder never pays a wallet through a coinbase.
    coinbase_globals: Vec<u64>,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0xfa57),
            blocks: Vec::new(),
            next_global: 0,
            coinbase_globals: Vec::new(),
        }
    }

    /// Blocks built so far.
    pub fn blocks(&self) -> &[PreparsedBlock] {
        &self.blocks
    }

    pub fn into_store(self) -> MemoryStore {
        MemoryStore::new(self.blocks)
    }

    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn hash_at(&self, height: u64) -> BlockHash {
        self.blocks[height as usize].entry.hash
    }

    /// Append `count` blocks containing only a coinbase.
    pub fn extend_empty(&mut self, count: usize) {
        for _ in 0..count {
            self.push_block(Vec::new());
        }
    }

    /// Append a block with one transaction paying `wallet` on its
    /// second output. Returns the global index of that output.
    pub fn add_block_paying(&mut self, wallet: &TestWallet) -> u64 {
        self.add_payment_block(wallet, None)
    }

    /// Like [`Self::add_block_paying`], except the tx-extra is
    /// replaced with garbage. A correct scanner skips the whole
    /// transaction, so the output must never be recognised.
    pub fn add_block_paying_bad_extra(&mut self, wallet: &TestWallet) -> u64 {
        self.add_payment_block(wallet, Some(vec![0x99, 0x01, 0x02]))
    }

    fn add_payment_block(&mut self, wallet: &TestWallet, extra_override: Option<Vec<u8>>) -> u64 {
        let tx_secret = Scalar::from_bytes_mod_order(self.rng.gen());
        let tx_public = EdwardsPoint::mul_base(&tx_secret);

        // Sender side: 8·r·A, then Hs(D ‖ i)·G + B for output 1.
        let derivation = (tx_secret * wallet.view_public).mul_by_cofactor();
        let mut to_hash = derivation.compress().to_bytes().to_vec();
        write_varint(1, &mut to_hash);
        let pay_key = (EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(
            Keccak256::digest(&to_hash).into(),
        )) + wallet.spend_public)
            .compress()
            .to_bytes();

        let outputs = vec![self.random_output_key(), pay_key];
        let offsets = self.decoy_offsets();
        let extra =
            extra_override.unwrap_or_else(|| pub_key_extra(tx_public.compress().to_bytes()));
        let tx = self.build_tx(
            1,
            &[TxInput::ToKey {
                absolute: offsets.clone(),
            }],
            &outputs,
            &extra,
        );

        // The coinbase takes one index, the decoy output another.
        let global = self.peek_global() + 2;
        self.push_block(vec![(tx, offsets)]);
        global
    }

    /// Append a block with a transaction whose inputs reference
    /// `mixins` (absolute global indices) without creating anything
    /// new for any wallet.
    pub fn add_block_spending(&mut self, mixins: &[u64]) {
        let outputs = vec![self.random_output_key()];
        let extra = pub_key_extra(self.random_output_key());
        let tx = self.build_tx(
            1,
            &[TxInput::ToKey {
                absolute: mixins.to_vec(),
            }],
            &outputs,
            &extra,
        );

        self.push_block(vec![(tx, mixins.to_vec())]);
    }

    /// Global index the next created output will get.
    fn peek_global(&self) -> u64 {
        self.next_global
    }

    fn random_point(&mut self) -> EdwardsPoint {
        EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(self.rng.gen()))
    }

    fn random_output_key(&mut self) -> Key {
        self.random_point().compress().to_bytes()
    }

    /// A plausible decoy ring: coinbase outputs never owned by any
    /// test wallet, or low indices before anything was built.
    fn decoy_offsets(&mut self) -> Vec<u64> {
        if self.coinbase_globals.len() >= 3 {
            let mut picks = Vec::with_capacity(3);
            for _ in 0..3 {
                let i = self.rng.gen_range(0..self.coinbase_globals.len());
                picks.push(self.coinbase_globals[i]);
            }
            picks.sort_unstable();
            picks.dedup();
            picks
        } else {
            vec![0]
        }
    }

    /// Rewind to `height` exclusive, as a reorganization would;
    /// blocks pushed afterwards retake the dropped heights with fresh
    /// hashes.
    pub fn pop_to(&mut self, height: u64) {
        self.blocks.truncate(height as usize);
        self.next_global = self
            .blocks
            .iter()
            .flat_map(|b| &b.txs)
            .flat_map(|tx| &tx.output_indices)
            .max()
            .map_or(0, |g| g + 1);
        self.coinbase_globals.retain(|g| *g < self.next_global);
    }

    /// Append a block holding a coinbase plus the given transactions,
    /// assigning global output indices and linking the header chain.
    fn push_block(&mut self, txs: Vec<(TxBuild, Vec<u64>)>) {
        let height = self.height();
        let timestamp = 1_700_000_000 + height * 120;
        let previous = if height == 0 {
            [0; 32]
        } else {
            self.hash_at(height - 1)
        };

        let mut header = Vec::new();
        write_varint(16, &mut header);
        write_varint(16, &mut header);
        write_varint(timestamp, &mut header);
        header.extend_from_slice(&previous);
        header.extend_from_slice(&(height as u32).to_le_bytes());

        let coinbase_key = self.random_output_key();
        let coinbase_extra = pub_key_extra(self.random_output_key());
        let coinbase =
            self.build_tx(2, &[TxInput::Gen { height }], &[coinbase_key], &coinbase_extra);

        let mut all = Vec::with_capacity(txs.len() + 1);
        let coinbase_global = self.next_global;
        self.next_global += 1;
        self.coinbase_globals.push(coinbase_global);
        all.push(PreparsedTx {
            hash: Keccak256::digest(&coinbase.blob).into(),
            blob: coinbase.blob,
            output_keys: coinbase.output_keys,
            output_indices: vec![coinbase_global],
            used_inputs: Vec::new(),
        });

        for (tx, used_inputs) in txs {
            let indices: Vec<u64> = (0..tx.output_keys.len() as u64)
                .map(|i| self.next_global + i)
                .collect();
            self.next_global += tx.output_keys.len() as u64;

            all.push(PreparsedTx {
                hash: Keccak256::digest(&tx.blob).into(),
                blob: tx.blob,
                output_keys: tx.output_keys,
                output_indices: indices,
                used_inputs,
            });
        }

        // The block id covers the transactions, so an alternate block
        // at the same height hashes differently.
        let mut hashing_blob = header.clone();
        for tx in &all {
            hashing_blob.extend_from_slice(&tx.hash);
        }
        let hash: BlockHash = Keccak256::digest(&hashing_blob).into();

        self.blocks.push(PreparsedBlock {
            entry: BlockEntry {
                height,
                hash,
                header,
                timestamp,
            },
            txs: all,
        });
    }

    /// Serialize a full transaction the way the chain carries it:
    /// version 1 gets zeroed ring signatures of the right shape,
    /// version 2 gets the `RctType::Null` marker of a miner tx.
    /// Either way the blob parses as a complete transaction; nothing
    /// verifies the signatures.
    fn build_tx(
        &mut self,
        version: u64,
        inputs: &[TxInput],
        output_keys: &[Key],
        extra: &[u8],
    ) -> TxBuild {
        // Ringct outputs carry a zero amount; v1 amounts are explicit.
        let amount = if version == 1 { 1_000_000_000 } else { 0 };

        let mut blob = Vec::new();
        write_varint(version, &mut blob);
        write_varint(0, &mut blob); // unlock time

        write_varint(inputs.len() as u64, &mut blob);
        for input in inputs {
            match input {
                TxInput::Gen { height } => {
                    blob.push(TXIN_GEN);
                    write_varint(*height, &mut blob);
                }
                TxInput::ToKey { absolute } => {
                    blob.push(TXIN_TO_KEY);
                    write_varint(amount, &mut blob);

                    // On the wire offsets are delta-encoded.
                    let mut sorted = absolute.clone();
                    sorted.sort_unstable();
                    write_varint(sorted.len() as u64, &mut blob);
                    let mut previous = 0;
                    for offset in sorted {
                        write_varint(offset - previous, &mut blob);
                        previous = offset;
                    }

                    // Key images are curve points, parsers check that.
                    let key_image = self.random_output_key();
                    blob.extend_from_slice(&key_image);
                }
            }
        }

        write_varint(output_keys.len() as u64, &mut blob);
        for key in output_keys {
            write_varint(amount, &mut blob);
            blob.push(TXOUT_TO_KEY);
            blob.extend_from_slice(key);
        }

        write_varint(extra.len() as u64, &mut blob);
        blob.extend_from_slice(extra);

        if version == 1 {
            // One (c, s) scalar pair per ring member, per input.
            for input in inputs {
                if let TxInput::ToKey { absolute } = input {
                    blob.extend(std::iter::repeat_n(0u8, 64 * absolute.len()));
                }
            }
        } else {
            blob.push(0); // RctType::Null
        }

        TxBuild {
            blob,
            output_keys: output_keys.to_vec(),
        }
    }
}

/// A tx-extra blob holding a single transaction public key.
fn pub_key_extra(key: Key) -> Vec<u8> {
    let mut extra = Vec::with_capacity(33);
    extra.push(EXTRA_PUB_KEY);
    extra.extend_from_slice(&key);
    extra
}


enum TxInput {
    Gen { height: u64 },
    ToKey { absolute: Vec<u64> },
}

struct TxBuild {
    blob: Vec<u8>,
    output_keys: Vec<Key>,
}

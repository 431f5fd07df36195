//! Shared types for the fastsync server.
//!
//! Key material, block identifiers and the per-request
//! [`WalletBlock`] unit that every other crate passes around, plus
//! the CryptoNote varint writer used when re-serializing blocks.
//! Parsing block and transaction blobs is `monero-serai`'s job, not
//! this crate's.

mod block;
pub mod io;

pub use block::{BlockCompleteEntry, WalletBlock};

use std::fmt;

/// A block hash.
pub type BlockHash = [u8; 32];

/// A compressed Ed25519 point or scalar as it appears on the wire.
pub type Key = [u8; 32];

/// A block height together with the hash of the block at that height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeightInfo {
    pub height: u64,
    pub hash: BlockHash,
}

/// The key pair a wallet is identified by: the secret view key and
/// the public spend key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletKeys {
    pub view_secret: Key,
    pub spend_public: Key,
}

impl fmt::Debug for WalletKeys {
    // The view key must never end up in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKeys")
            .field("view_secret", &"<redacted>")
            .field("spend_public", &hex::encode(self.spend_public))
            .finish()
    }
}

/// A wallet key pair as supplied by a client, with the height the
/// wallet claims it was created at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub keys: WalletKeys,
    pub created_at: u64,
}

/// A wallet row resolved from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletEntry {
    /// The store-assigned wallet id.
    pub id: i32,
    pub keys: WalletKeys,
    /// Height of the last block this wallet was scanned up to.
    pub scanned_height: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_keys_debug_redacts_view_secret() {
        let keys = WalletKeys {
            view_secret: [0xaa; 32],
            spend_public: [0xbb; 32],
        };

        let s = format!("{keys:?}");
        assert!(!s.contains("aaaa"));
        assert!(s.contains(&hex::encode([0xbb; 32])));
    }
}

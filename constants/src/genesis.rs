//! Genesis block data per network.
//!
//! The store is filled by an external indexer; on startup the server
//! checks the block it holds at height 0 against these constants so a
//! mainnet server can never silently serve a stagenet database.

use hex_literal::hex;

use fastsync_types::BlockHash;

use crate::Network;

/// The fixed first block of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisBlock {
    pub hash: BlockHash,
    /// Serialized block header.
    pub header: &'static [u8],
    pub timestamp: u64,
    /// Serialized coinbase transaction.
    pub tx_blob: &'static [u8],
}

/// Mainnet genesis header: v1, zero timestamp, zero previous hash,
/// nonce 10000.
const MAINNET_GENESIS_HEADER: &[u8] = &hex!(
    "010000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "10270000"
);

const MAINNET_GENESIS_TX: &[u8] = &hex!(
    "013c01ff0001ffffffffffff03029b2e4c0281c0b02e7c53291a94d1d0cbff8883f802"
    "4f5142ee494ffbbd08807121017767aafcde9be00dcfd098715ebcf7f410daebc582fd"
    "a69d24a28e9d0bc890d1"
);

/// Stagenet genesis header: as mainnet but nonce 10002.
const STAGENET_GENESIS_HEADER: &[u8] = &hex!(
    "010000"
    "0000000000000000000000000000000000000000000000000000000000000000"
    "12270000"
);

const STAGENET_GENESIS_TX: &[u8] = &hex!(
    "013c01ff0001ffffffffffff0302df5d56da0c7d643ddd1ce61901c7bdc5fb1738bfe3"
    "9fbe69c28a3a7032729c0f2101168d0c4ca86fb55a4cf6a36d31431be1c53a3bd7411b"
    "b24e8832410289fa6f3b"
);

/// Returns the genesis block of `network`.
pub const fn genesis_block(network: Network) -> GenesisBlock {
    match network {
        Network::Mainnet => GenesisBlock {
            hash: hex!("418015bb9ae982a1975da7d79277c2705727a56894ba0fb246adaabb1f4632e3"),
            header: MAINNET_GENESIS_HEADER,
            timestamp: 0,
            tx_blob: MAINNET_GENESIS_TX,
        },
        Network::Stagenet => GenesisBlock {
            hash: hex!("76ee3cc98646292206cd3e86f74d88b4dcc1d937088645e9b0cbca84b7ce74eb"),
            header: STAGENET_GENESIS_HEADER,
            timestamp: 0,
            tx_blob: STAGENET_GENESIS_TX,
        },
    }
}

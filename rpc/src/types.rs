//! Wire types of the fastsync protocol, epee-encoded.
//!
//! Field names follow the C++ serialization maps of the wallets that
//! consume this endpoint; changing one is a protocol break.

use cuprate_epee_encoding::epee_object;

use fastsync_types::{BlockCompleteEntry, BlockHash};

/// `POST /fastsync.bin` request body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GetBlocksRequest {
    pub version: u32,
    pub params: WalletChainInfo,
}

epee_object! {
    GetBlocksRequest,
    version: u32,
    params: WalletChainInfo,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalletChainInfo {
    pub keys: Vec<WalletKeysInfo>,
    /// Concatenated 32-byte hashes, densest near the client's tip.
    pub short_chain: Vec<u8>,
}

epee_object! {
    WalletChainInfo,
    keys: Vec<WalletKeysInfo>,
    short_chain: Vec<u8>,
}

impl WalletChainInfo {
    /// The short chain split back into hashes.
    pub fn short_chain_hashes(&self) -> Option<Vec<BlockHash>> {
        if self.short_chain.is_empty() || self.short_chain.len() % 32 != 0 {
            return None;
        }

        Some(
            self.short_chain
                .chunks_exact(32)
                .map(|c| c.try_into().expect("chunks are 32 bytes"))
                .collect(),
        )
    }

    pub fn set_short_chain(&mut self, hashes: &[BlockHash]) {
        self.short_chain = hashes.concat();
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalletKeysInfo {
    pub view_secret_key: [u8; 32],
    pub spend_public_key: [u8; 32],
    pub created_at: u64,
}

epee_object! {
    WalletKeysInfo,
    view_secret_key: [u8; 32],
    spend_public_key: [u8; 32],
    created_at: u64,
}

/// `POST /fastsync.bin` response body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GetBlocksResponse {
    /// `"ok"`, or a short human-readable failure reason.
    pub status: String,
    pub result: WalletBlocksResult,
}

epee_object! {
    GetBlocksResponse,
    status: String,
    result: WalletBlocksResult,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalletBlocksResult {
    pub start_height: u64,
    pub total_height: u64,
    pub blocks: Vec<WalletBlockInfo>,
}

epee_object! {
    WalletBlocksResult,
    start_height: u64,
    total_height: u64,
    blocks: Vec<WalletBlockInfo>,
}

/// One wallet-block result on the wire. Skeletons carry an empty
/// block-complete entry and no output indices.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalletBlockInfo {
    pub hash: [u8; 32],
    pub timestamp: u64,
    pub block: BlockCompleteEntry,
    pub output_indices: BlockOutputIndices,
}

epee_object! {
    WalletBlockInfo,
    hash: [u8; 32],
    timestamp: u64,
    block: BlockCompleteEntry,
    output_indices: BlockOutputIndices,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TxOutputIndices {
    pub indices: Vec<u64>,
}

epee_object! {
    TxOutputIndices,
    indices: Vec<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlockOutputIndices {
    pub indices: Vec<TxOutputIndices>,
}

epee_object! {
    BlockOutputIndices,
    indices: Vec<TxOutputIndices>,
}

impl BlockOutputIndices {
    pub fn from_indices(outs: &[Vec<u64>]) -> Self {
        Self {
            indices: outs
                .iter()
                .map(|indices| TxOutputIndices {
                    indices: indices.clone(),
                })
                .collect(),
        }
    }
}

/// `/fastsync_versions.bin` response body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SupportedVersionsResponse {
    pub versions: Vec<u32>,
}

epee_object! {
    SupportedVersionsResponse,
    versions("supported_versions"): Vec<u32>,
}

#[cfg(test)]
mod tests {
    use cuprate_epee_encoding::{from_bytes, to_bytes};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn request_roundtrip() {
        let mut request = GetBlocksRequest {
            version: 1,
            params: WalletChainInfo {
                keys: vec![WalletKeysInfo {
                    view_secret_key: [1; 32],
                    spend_public_key: [2; 32],
                    created_at: 110_000,
                }],
                short_chain: Vec::new(),
            },
        };
        request.params.set_short_chain(&[[3; 32], [4; 32]]);

        let bytes = to_bytes(request.clone()).unwrap();
        let decoded: GetBlocksRequest = from_bytes(&mut bytes.freeze()).unwrap();

        assert_eq!(decoded, request);
        assert_eq!(
            decoded.params.short_chain_hashes().unwrap(),
            vec![[3; 32], [4; 32]]
        );
    }

    #[test]
    fn short_chain_must_be_whole_hashes() {
        let info = WalletChainInfo {
            keys: Vec::new(),
            short_chain: vec![0; 33],
        };
        assert_eq!(info.short_chain_hashes(), None);

        let empty = WalletChainInfo::default();
        assert_eq!(empty.short_chain_hashes(), None);
    }

    #[test]
    fn response_roundtrip_with_skeleton_and_full_block() {
        let response = GetBlocksResponse {
            status: "ok".into(),
            result: WalletBlocksResult {
                start_height: 100,
                total_height: 200,
                blocks: vec![
                    // Skeleton.
                    WalletBlockInfo {
                        hash: [7; 32],
                        timestamp: 1234,
                        ..Default::default()
                    },
                    WalletBlockInfo {
                        hash: [8; 32],
                        timestamp: 1235,
                        block: BlockCompleteEntry {
                            block: vec![1, 2, 3].into(),
                            txs: vec![vec![4, 5].into()],
                        },
                        output_indices: BlockOutputIndices::from_indices(&[
                            vec![10],
                            vec![11, 12],
                        ]),
                    },
                ],
            },
        };

        let bytes = to_bytes(response.clone()).unwrap();
        let decoded: GetBlocksResponse = from_bytes(&mut bytes.freeze()).unwrap();

        assert_eq!(decoded, response);
    }

    #[test]
    fn versions_roundtrip() {
        let versions = SupportedVersionsResponse { versions: vec![1] };

        let bytes = to_bytes(versions.clone()).unwrap();
        let decoded: SupportedVersionsResponse = from_bytes(&mut bytes.freeze()).unwrap();

        assert_eq!(decoded, versions);
    }
}

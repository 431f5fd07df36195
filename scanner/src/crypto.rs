//! The view-key side of CryptoNote stealth addresses.
//!
//! A sender with ephemeral key pair (r, R) locks output `i` to
//! `P_i = Hs(8·r·A ‖ i)·G + B` for a recipient with view key A and
//! spend key B. Knowing the secret view key `a` we reconstruct the
//! shared point as `8·a·R` and re-derive the expected `P_i` for every
//! output; a byte-for-byte match means the output is ours.

use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use sha3::{Digest, Keccak256};

use fastsync_types::{io::write_varint, Key};

/// Monero's `hash_to_scalar`: Keccak-256 reduced into the group
/// order.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(Keccak256::digest(data).into())
}

/// The shared derivation `8 · a · R`.
pub fn key_derivation(view_secret: &Scalar, tx_pub_key: &EdwardsPoint) -> EdwardsPoint {
    (view_secret * tx_pub_key).mul_by_cofactor()
}

/// `Hs(derivation ‖ varint(output_index))`.
pub fn derivation_to_scalar(derivation: &EdwardsPoint, output_index: u64) -> Scalar {
    let mut buf = derivation.compress().to_bytes().to_vec();
    write_varint(output_index, &mut buf);
    hash_to_scalar(&buf)
}

/// The one-time key this wallet would see at `output_index`:
/// `Hs(derivation ‖ i)·G + B`, compressed for comparison against the
/// key on the wire.
pub fn derive_output_key(
    derivation: &EdwardsPoint,
    output_index: u64,
    spend_public: &EdwardsPoint,
) -> Key {
    (EdwardsPoint::mul_base(&derivation_to_scalar(derivation, output_index)) + spend_public)
        .compress()
        .to_bytes()
}

/// Decompress a wire-format point.
pub fn decompress(key: &Key) -> Option<EdwardsPoint> {
    CompressedEdwardsY(*key).decompress()
}

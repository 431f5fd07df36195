//! Pulling transaction public keys out of the tx-extra field.
//!
//! `monero-serai` deliberately leaves `TransactionPrefix::extra` as
//! opaque bytes; its sub-field grammar belongs to wallet scanning,
//! which is exactly what this server does itself. So the tag walk
//! lives here, limited to the handful of tags that exist on-chain.

use thiserror::Error;

use fastsync_types::Key;

const PADDING: u8 = 0x00;
const PUB_KEY: u8 = 0x01;
const NONCE: u8 = 0x02;
const MERGE_MINING: u8 = 0x03;
const ADDITIONAL_PUB_KEYS: u8 = 0x04;
const MYSTERIOUS_MINERGATE: u8 = 0xde;

/// Longest run of zero padding allowed.
const PADDING_MAX_COUNT: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtraError {
    #[error("unexpected end of tx-extra")]
    UnexpectedEof,
    #[error("tx-extra varint is malformed")]
    BadVarint,
    #[error("unknown tx-extra tag {0:#04x}")]
    UnknownTag(u8),
    #[error("tx-extra padding is malformed")]
    BadPadding,
}

/// Every transaction public key in `extra`: the main `R` plus any
/// additional per-output keys.
///
/// Extra is technically free-form; anything that does not parse as
/// the known sub-fields is an error the caller is expected to treat
/// as "skip this transaction", not as fatal.
pub fn extra_pub_keys(mut extra: &[u8]) -> Result<Vec<Key>, ExtraError> {
    let r = &mut extra;
    let mut keys = Vec::new();

    while !r.is_empty() {
        match read_byte(r)? {
            PADDING => {
                // Zero bytes to the end, bounded.
                if r.len() >= PADDING_MAX_COUNT || r.iter().any(|b| *b != 0) {
                    return Err(ExtraError::BadPadding);
                }
                break;
            }
            PUB_KEY => keys.push(read_key(r)?),
            ADDITIONAL_PUB_KEYS => {
                let count = read_varint(r)?;
                for _ in 0..count {
                    keys.push(read_key(r)?);
                }
            }
            NONCE | MERGE_MINING | MYSTERIOUS_MINERGATE => {
                let len = read_varint(r)?;
                if (r.len() as u64) < len {
                    return Err(ExtraError::UnexpectedEof);
                }
                *r = &r[len as usize..];
            }
            tag => return Err(ExtraError::UnknownTag(tag)),
        }
    }

    Ok(keys)
}

fn read_byte(r: &mut &[u8]) -> Result<u8, ExtraError> {
    let (b, rest) = r.split_first().ok_or(ExtraError::UnexpectedEof)?;
    *r = rest;
    Ok(*b)
}

fn read_key(r: &mut &[u8]) -> Result<Key, ExtraError> {
    if r.len() < 32 {
        return Err(ExtraError::UnexpectedEof);
    }

    let (key, rest) = r.split_at(32);
    *r = rest;
    Ok(key.try_into().expect("split_at returns 32 bytes"))
}

fn read_varint(r: &mut &[u8]) -> Result<u64, ExtraError> {
    let mut n: u64 = 0;

    for shift in (0..64).step_by(7) {
        let b = read_byte(r)?;

        let bits = u64::from(b & 0x7f);
        if shift + 7 > 64 && bits >> (64 - shift) != 0 {
            return Err(ExtraError::BadVarint);
        }

        n |= bits << shift;
        if b & 0x80 == 0 {
            // No trailing zero bytes: one canonical encoding per value.
            if b == 0 && shift != 0 {
                return Err(ExtraError::BadVarint);
            }
            return Ok(n);
        }
    }

    Err(ExtraError::BadVarint)
}

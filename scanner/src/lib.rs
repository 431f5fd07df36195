//! Wallet-output scanning.
//!
//! Given a wallet's keys and a starting height the scanner produces a
//! run of [`fastsync_types::WalletBlock`]s, either straight from the
//! per-wallet cache in the store or by cryptographically testing
//! fresh blocks against the wallet's view key.

pub mod crypto;
mod extra;
mod scan;

pub use scan::{BlockScanner, ScanError, Scanner};

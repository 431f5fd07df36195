//! Test fixtures: an in-memory [`fastsync_storage::WalletStore`] and
//! a builder for synthetic chains whose outputs really scan.
//!
//! The chain builder plays the *sender* side of the stealth-address
//! scheme with its own curve arithmetic, so scanner tests check the
//! receiver side against an independent construction rather than
//! against itself.

mod chain;
mod store;

pub use chain::{ChainBuilder, TestWallet};
pub use store::MemoryStore;

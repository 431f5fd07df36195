//! Constant/static data used throughout fastsync.

mod genesis;
mod network;

pub use genesis::{genesis_block, GenesisBlock};
pub use network::{Network, UnknownNetwork};

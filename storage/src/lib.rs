//! PostgreSQL block/wallet store gateway.
//!
//! [`WalletStore`] is the interface the scanner, the job queue and
//! the request handler talk to; [`PgWalletStore`] is the production
//! implementation over a [`sqlx::PgPool`]. The chain tables are
//! filled by an external indexer, see `schema.sql`.

mod error;
mod postgres;
mod store;
mod types;

pub use error::StoreError;
pub use postgres::{Config, PgWalletStore};
pub use store::WalletStore;
pub use types::{BlockEntry, OutputHeight, PreparsedBlock, PreparsedTx, SerializedTx, TaggedBlock};

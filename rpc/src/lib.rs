//! The client-facing RPC surface: epee (binary KV) request/response
//! types, the request handler, and the HTTP server for
//! `/fastsync.bin` and `/fastsync_versions.bin`.

mod handler;
mod server;
pub mod types;

pub use handler::{BlocksHandler, HandlerError};
pub use server::{router, GET_BLOCKS_URI, SUPPORTED_VERSIONS, VERSIONS_URI};

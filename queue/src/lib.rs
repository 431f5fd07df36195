//! Per-wallet scan jobs, the worker pool that drives them and the
//! in-memory cache of produced results.
//!
//! Each active wallet maps to exactly one job holding a [`BulkList`]
//! of already-produced results. Requests for a wallet coalesce onto
//! its job and block on a [`BlocksListener`] until enough consecutive
//! results exist; workers pull free jobs round-robin, advance each by
//! one scan batch and wake the listeners.

mod bulk;
mod job;
mod queue;

pub use bulk::BulkList;
pub use job::BlocksListener;
pub use queue::{Config, JobsQueue};

//! One background scan job per active wallet.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use tokio::sync::Notify;

use fastsync_scanner::ScanError;
use fastsync_types::{WalletBlock, WalletEntry};

use crate::bulk::BulkList;

/// Listeners wake up once at least this many consecutive results are
/// available, unless the chain itself has nothing more to offer. A
/// smaller response would look like "you are synced" to the client
/// and stop it.
const MIN_LISTENER_BLOCKS: usize = 4;

/// A wallet's scan job: its bulk list of produced results plus the
/// coordination state between workers and listeners.
///
/// Identity is the wallet key pair; the job survives across requests
/// so its cache does too, until the janitor evicts it.
pub(crate) struct Job {
    /// `scanned_height` in here is a snapshot from creation time; the
    /// worker re-reads the cursor from the store on every step.
    pub(crate) wallet: WalletEntry,
    state: Mutex<JobState>,
    /// Wakes listeners after every deposit or error.
    notify: Notify,
}

struct JobState {
    blocks: BulkList,
    error: Option<ScanError>,
    in_progress: bool,
    last_query: Instant,
    /// Chain tip as of the last request that touched this job.
    chain_height: u64,
}

impl Job {
    pub(crate) fn new(wallet: WalletEntry, start_height: u64, chain_height: u64) -> Self {
        let mut blocks = BulkList::new();
        // Marker so the first worker step knows where to scan from.
        blocks.add(start_height, &[]);

        Self {
            wallet,
            state: Mutex::new(JobState {
                blocks,
                error: None,
                in_progress: false,
                last_query: Instant::now(),
                chain_height,
            }),
            notify: Notify::new(),
        }
    }

    /// A repeated request for this wallet: refresh the expiry clock
    /// and the tip snapshot, and anchor the requested start height.
    pub(crate) fn touch(&self, chain_height: u64, start_height: u64) {
        let mut state = self.state.lock().unwrap();
        state.last_query = Instant::now();
        state.chain_height = chain_height;
        state.blocks.add(start_height, &[]);
    }

    /// Block until `min`-many results are available from `from` or an
    /// error is posted. The error is consumed by the waiter that sees
    /// it.
    async fn wait_blocks(
        &self,
        from: u64,
        max_count: usize,
    ) -> Result<Vec<Arc<WalletBlock>>, ScanError> {
        loop {
            let notified = self.notify.notified();

            {
                let mut state = self.state.lock().unwrap();

                if let Some(err) = state.error.take() {
                    return Err(err);
                }

                // Until the scan has reached the chain tip a tiny
                // response must be held back, see MIN_LISTENER_BLOCKS.
                let (next, _) = state.blocks.find_missing();
                let min_count = if next >= state.chain_height {
                    1
                } else {
                    MIN_LISTENER_BLOCKS
                };

                if state.blocks.available(from) >= min_count {
                    return Ok(state.blocks.get(from, max_count));
                }
            }

            notified.await;
        }
    }

    /// Deposit one scan batch and wake every listener.
    pub(crate) fn set_blocks(&self, start: u64, blocks: &[Arc<WalletBlock>]) {
        let mut state = self.state.lock().unwrap();
        state.blocks.add(start, blocks);
        drop(state);

        self.notify.notify_waiters();
    }

    /// Post a terminal error and wake every listener; the first to
    /// wake consumes it.
    pub(crate) fn set_error(&self, error: ScanError) {
        let mut state = self.state.lock().unwrap();
        state.error = Some(error);
        drop(state);

        self.notify.notify_waiters();
    }

    /// Discard cached results above `height`; used when the persisted
    /// scan cursor moved backwards after a reorganization.
    pub(crate) fn trim(&self, height: u64) {
        self.state.lock().unwrap().blocks.trim(height);
    }

    pub(crate) fn find_missing(&self) -> (u64, usize) {
        self.state.lock().unwrap().blocks.find_missing()
    }

    pub(crate) fn set_in_progress(&self, in_progress: bool) {
        self.state.lock().unwrap().in_progress = in_progress;
    }

    /// Whether a worker should pick this job up, judged against the
    /// current tip and the job lifetime.
    pub(crate) fn is_free(&self, chain_height: u64, lifetime: std::time::Duration) -> bool {
        let state = self.state.lock().unwrap();

        let (next, _) = state.blocks.find_missing();
        let synced = state.blocks.available(chain_height) != 0 && next >= chain_height;

        !state.in_progress && !synced && state.last_query.elapsed() < lifetime
    }

    pub(crate) fn is_fresh(&self, lifetime: std::time::Duration) -> bool {
        self.state.lock().unwrap().last_query.elapsed() < lifetime
    }
}

/// A handle bound to (job, start height, response cap); the response
/// path blocks on it until the job has produced enough.
pub struct BlocksListener {
    job: Arc<Job>,
    return_from: u64,
    max_blocks: usize,
}

impl BlocksListener {
    pub(crate) fn new(job: Arc<Job>, return_from: u64, max_blocks: usize) -> Self {
        Self {
            job,
            return_from,
            max_blocks,
        }
    }

    /// Wait for the job to produce enough results, then return up to
    /// `max_blocks` of them starting at the requested height.
    pub async fn wait(&self) -> Result<Vec<Arc<WalletBlock>>, ScanError> {
        self.job.wait_blocks(self.return_from, self.max_blocks).await
    }
}

//! The deduplicating job queue and its worker pool.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::{sync::Notify, time};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, error, info};

use fastsync_scanner::Scanner;
use fastsync_storage::{StoreError, WalletStore};
use fastsync_types::WalletEntry;

use crate::job::{BlocksListener, Job};

/// Tuning knobs of the queue.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker tasks.
    pub workers: usize,
    /// Blocks a worker scans per step.
    pub process_blocks: usize,
    /// Blocks a listener returns per response at most.
    pub result_blocks: usize,
    /// Jobs untouched for this long are skipped and then evicted.
    pub job_lifetime: Duration,
    /// How often the chain tip is refreshed from the store.
    pub top_update_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 4,
            process_blocks: 1000,
            result_blocks: 1000,
            job_lifetime: Duration::from_secs(60),
            top_update_interval: Duration::from_secs(30),
        }
    }
}

struct QueueState {
    /// Round-robin order: a finished job moves to the tail.
    jobs: Vec<Arc<Job>>,
    stopped: bool,
}

/// One job per active wallet; workers pull free jobs in order and
/// advance each by one scan batch.
pub struct JobsQueue {
    state: Mutex<QueueState>,
    /// Wakes workers when a job is added, touched or released.
    notify: Notify,
    chain_height: AtomicU64,
    store: Arc<dyn WalletStore>,
    scanner: Arc<dyn Scanner>,
    config: Config,
}

impl JobsQueue {
    pub fn new(store: Arc<dyn WalletStore>, scanner: Arc<dyn Scanner>, config: Config) -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: Vec::new(),
                stopped: false,
            }),
            notify: Notify::new(),
            chain_height: AtomicU64::new(0),
            store,
            scanner,
            config,
        }
    }

    /// Spawn the workers, the tip updater and the job janitor onto
    /// `tracker`.
    ///
    /// The tip is fetched once up front so no worker starts against a
    /// zero chain height; a store that cannot even serve that is a
    /// startup failure.
    pub async fn start(
        self: &Arc<Self>,
        tracker: &TaskTracker,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        self.update_top_height().await?;
        debug!(
            height = self.chain_height(),
            "top block height retrieved"
        );

        debug!(count = self.config.workers, "starting workers");
        for id in 0..self.config.workers {
            let queue = Arc::clone(self);
            tracker.spawn(async move { queue.worker_loop(id).await });
        }

        let queue = Arc::clone(self);
        let token = cancel.clone();
        tracker.spawn(async move { queue.top_updater_loop(token).await });

        let queue = Arc::clone(self);
        let token = cancel.clone();
        tracker.spawn(async move { queue.janitor_loop(token).await });

        Ok(())
    }

    /// Wake every worker into its stop check. Callers cancel the
    /// background tasks' token and then wait on the tracker.
    pub fn stop(&self) {
        self.state.lock().unwrap().stopped = true;
        self.notify.notify_waiters();
        info!("job queue stopped");
    }

    /// Chain tip as of the last updater run.
    pub fn chain_height(&self) -> u64 {
        self.chain_height.load(Ordering::Relaxed)
    }

    /// Number of live jobs, synced or not.
    pub fn job_count(&self) -> usize {
        self.state.lock().unwrap().jobs.len()
    }

    /// Bind `wallet` to its job, creating one when this is the first
    /// request, and hand back a listener at `start_height`.
    ///
    /// Requests for the same key pair coalesce: they share the job
    /// and its cache, and only refresh its expiry and tip snapshot.
    pub fn add_job(&self, wallet: WalletEntry, start_height: u64) -> BlocksListener {
        let mut state = self.state.lock().unwrap();
        let tip = self.chain_height();

        let job = match state
            .jobs
            .iter()
            .find(|j| j.wallet.keys == wallet.keys)
        {
            Some(job) => {
                job.touch(tip, start_height);
                Arc::clone(job)
            }
            None => {
                let job = Arc::new(Job::new(wallet, start_height, tip));
                state.jobs.push(Arc::clone(&job));
                job
            }
        };
        drop(state);

        self.notify.notify_one();
        BlocksListener::new(job, start_height, self.config.result_blocks)
    }

    async fn worker_loop(&self, id: usize) {
        debug!(worker = id, "worker started");

        loop {
            let Some(job) = self.wait_job().await else {
                debug!(worker = id, "worker stopping");
                return;
            };

            self.process_job(&job).await;
            self.job_done(&job);
        }
    }

    /// Park until the queue is stopped or a free job exists; claims
    /// the job before returning it.
    async fn wait_job(&self) -> Option<Arc<Job>> {
        loop {
            let notified = self.notify.notified();

            {
                let state = self.state.lock().unwrap();

                if state.stopped {
                    return None;
                }

                let tip = self.chain_height();
                if let Some(job) = state
                    .jobs
                    .iter()
                    .find(|j| j.is_free(tip, self.config.job_lifetime))
                {
                    job.set_in_progress(true);
                    return Some(Arc::clone(job));
                }
            }

            notified.await;
        }
    }

    /// One worker step: sync the bulk list with the persisted scan
    /// cursor, pick the next window, scan it, deposit the results.
    async fn process_job(&self, job: &Arc<Job>) {
        let top = match self.store.top_scanned_height(job.wallet.id).await {
            Ok(top) => top,
            Err(e) => {
                job.set_error(e.into());
                return;
            }
        };

        // A cursor below the cache means a chain split: everything
        // above it is stale.
        job.trim(top.height);

        let (start, mut count) = job.find_missing();
        if count == 0 || count > self.config.process_blocks {
            count = self.config.process_blocks;
        }

        let wallet = WalletEntry {
            scanned_height: top.height,
            ..job.wallet
        };

        match self.scanner.get_blocks(start, wallet, count).await {
            Ok(blocks) => {
                let blocks: Vec<_> = blocks.into_iter().map(Arc::new).collect();
                job.set_blocks(start, &blocks);
            }
            Err(e) => job.set_error(e),
        }
    }

    /// Release the job and rotate it to the tail so the other jobs
    /// get their turn.
    fn job_done(&self, job: &Arc<Job>) {
        let mut state = self.state.lock().unwrap();

        // The janitor may have evicted it meanwhile; do not resurrect.
        if let Some(i) = state.jobs.iter().position(|j| Arc::ptr_eq(j, job)) {
            let job = state.jobs.remove(i);
            state.jobs.push(job);
        }
        drop(state);

        job.set_in_progress(false);
        self.notify.notify_one();
    }

    async fn update_top_height(&self) -> Result<(), StoreError> {
        let height = self.store.top_block_height().await.map_err(|e| {
            error!("failed to get top block height: {e}");
            e
        })?;

        self.chain_height.store(height, Ordering::Relaxed);
        Ok(())
    }

    async fn top_updater_loop(&self, cancel: CancellationToken) {
        let mut ticker = time::interval_at(
            time::Instant::now() + self.config.top_update_interval,
            self.config.top_update_interval,
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("stop signal received, stopping top block update loop");
                    return;
                }
                _ = ticker.tick() => {
                    // Failures keep the previous tip; the next tick
                    // retries.
                    drop(self.update_top_height().await);
                }
            }
        }
    }

    /// Periodically drop jobs no request has touched for a lifetime.
    async fn janitor_loop(&self, cancel: CancellationToken) {
        let mut ticker = time::interval_at(
            time::Instant::now() + self.config.job_lifetime,
            self.config.job_lifetime,
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("stop signal received, stopping job janitor loop");
                    return;
                }
                _ = ticker.tick() => {
                    let mut state = self.state.lock().unwrap();
                    let before = state.jobs.len();
                    let lifetime = self.config.job_lifetime;
                    state.jobs.retain(|j| j.is_fresh(lifetime));

                    let evicted = before - state.jobs.len();
                    if evicted > 0 {
                        debug!(evicted, "evicted expired jobs");
                    }
                }
            }
        }
    }
}

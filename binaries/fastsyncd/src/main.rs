//! The fastsync daemon: serves pre-filtered block streams to wallets
//! over `/fastsync.bin`, backed by the store an external indexer
//! keeps filled.

mod config;
mod logging;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::info;

use fastsync_constants::{genesis_block, Network};
use fastsync_queue::JobsQueue;
use fastsync_rpc::BlocksHandler;
use fastsync_scanner::BlockScanner;
use fastsync_storage::{PgWalletStore, WalletStore};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, short, default_value = "fastsyncd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::read(&args.config)?;
    logging::init(&config.log_level)?;

    let network = config.network()?;
    info!(%network, "starting fastsyncd");

    info!(
        host = %config.blockchain_db.host,
        port = config.blockchain_db.port,
        database = %config.blockchain_db.database,
        user = %config.blockchain_db.user,
        "connecting to database"
    );
    let store = Arc::new(
        PgWalletStore::connect(&config.blockchain_db)
            .await
            .context("failed to connect to the database")?,
    );

    verify_genesis(&*store, network).await?;

    let scanner = Arc::new(BlockScanner::new(store.clone()));
    let queue = Arc::new(JobsQueue::new(
        store.clone(),
        scanner,
        config.queue_config(),
    ));

    let tracker = TaskTracker::new();
    let cancel = CancellationToken::new();
    queue
        .start(&tracker, &cancel)
        .await
        .context("failed to start workers")?;

    let handler = Arc::new(BlocksHandler::new(store.clone(), queue.clone()));
    let router = fastsync_rpc::router(handler);

    let listener = tokio::net::TcpListener::bind(&config.server)
        .await
        .with_context(|| format!("failed to listen on address '{}'", config.server))?;
    info!(address = %config.server, "starting server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped by signal");

    // Stop background tasks: cancel the updater and the janitor,
    // wake every worker into its stop check, wait for all of them.
    cancel.cancel();
    queue.stop();
    tracker.close();
    tracker.wait().await;
    info!("workers stopped");

    Ok(())
}

/// The store must hold our network's chain: compare the block at
/// height 0 against the genesis constant.
async fn verify_genesis(store: &dyn WalletStore, network: Network) -> anyhow::Result<()> {
    let genesis = genesis_block(network);
    let entry = store
        .block_entry(0)
        .await
        .context("store has no genesis block; has the indexer run?")?;

    anyhow::ensure!(
        entry.hash == genesis.hash,
        "genesis block mismatch: the store holds {}, {} expects {}",
        hex::encode(entry.hash),
        network,
        hex::encode(genesis.hash),
    );

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

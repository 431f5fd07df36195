//! fastsyncd configuration, read from a TOML file.

use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use fastsync_constants::Network;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Bind address of the RPC server.
    #[serde(default = "default_server")]
    pub server: String,
    /// Reserved bind address for a process debug endpoint; accepted
    /// and validated, not served by this build.
    #[serde(default)]
    pub debug_endpoint: Option<String>,
    pub blockchain_db: fastsync_storage::Config,
    /// `mainnet` or `stagenet`.
    pub network: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Blocks a worker scans per step.
    #[serde(default = "default_batch")]
    pub process_blocks: usize,
    /// Blocks returned per response at most.
    #[serde(default = "default_batch")]
    pub result_blocks: usize,
    /// Seconds an untouched job stays alive.
    #[serde(default = "default_job_lifetime")]
    pub job_lifetime: u64,
}

const fn default_workers() -> usize {
    4
}

const fn default_batch() -> usize {
    1000
}

const fn default_job_lifetime() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_server() -> String {
    "127.0.0.1:18081".to_string()
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("couldn't read config file {}", path.display()))?;

        let config: Self = toml::from_str(&raw).context("couldn't parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.network()?;
        anyhow::ensure!(self.workers > 0, "workers must be positive");
        anyhow::ensure!(self.process_blocks > 0, "process_blocks must be positive");
        anyhow::ensure!(self.result_blocks > 0, "result_blocks must be positive");
        anyhow::ensure!(self.job_lifetime > 0, "job_lifetime must be positive");
        Ok(())
    }

    pub fn network(&self) -> anyhow::Result<Network> {
        Ok(self.network.parse::<Network>()?)
    }

    pub fn queue_config(&self) -> fastsync_queue::Config {
        fastsync_queue::Config {
            workers: self.workers,
            process_blocks: self.process_blocks,
            result_blocks: self.result_blocks,
            job_lifetime: Duration::from_secs(self.job_lifetime),
            ..fastsync_queue::Config::default()
        }
    }
}

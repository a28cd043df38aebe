use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use intkey_client::ClientConfig;
use tracing::Level;

use super::{load::LoadTestConfig, metrics::TestConfig, waiter::WaitConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "intkey-load")]
#[command(about = "Load test and convergence check for integer-key validators", long_about = None)]
pub struct LoadArgs {
    /// Validators to monitor
    #[arg(long, env = "VALIDATOR_COUNT", default_value = "3")]
    pub count: u16,

    /// Base validator url
    #[arg(long, env = "VALIDATOR_URL", default_value = "http://localhost")]
    pub url: String,

    /// Base validator http port
    #[arg(long, env = "VALIDATOR_PORT", default_value = "8800")]
    pub port: u16,

    /// Keys to create/exercise
    #[arg(long, default_value = "10")]
    pub keys: usize,

    /// Rounds to execute
    #[arg(long, default_value = "2")]
    pub rounds: usize,

    /// Inter-transaction time (milliseconds)
    #[arg(long, default_value = "0")]
    pub interval: u64,

    /// Execute the missing dependency test once after the transaction rounds
    #[arg(long, alias = "missingdep")]
    pub missing_dep: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seconds to wait for transactions to commit on every validator
    #[arg(long, default_value = "240")]
    pub commit_timeout: u64,

    /// Seconds to watch transactions with missing dependencies
    #[arg(long, default_value = "120")]
    pub no_commit_timeout: u64,

    /// Pause between status polls (milliseconds)
    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Per-request timeout (seconds)
    #[arg(long, default_value = "10")]
    pub request_timeout: u64,

    /// Retries for a failed status query
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Output file for results (JSON)
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Format for logs, can be json or text
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl LoadArgs {
    /// One url per validator: `url:port+i` for `i` in `0..count`.
    pub fn endpoint_urls(&self) -> Vec<String> {
        let base = self.url.trim_end_matches('/');
        (0..self.count).map(|i| format!("{base}:{}", u32::from(self.port) + u32::from(i))).collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.request_timeout),
            max_retries: self.max_retries,
            ..Default::default()
        }
    }

    pub fn load_test_config(&self) -> LoadTestConfig {
        LoadTestConfig {
            wait: WaitConfig {
                commit_timeout: Duration::from_secs(self.commit_timeout),
                no_commit_timeout: Duration::from_secs(self.no_commit_timeout),
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                show_progress: !self.no_progress,
            },
            ..Default::default()
        }
    }

    pub fn test_config(&self) -> TestConfig {
        TestConfig {
            endpoints: self.endpoint_urls(),
            keys: self.keys,
            rounds: self.rounds,
            interval_ms: self.interval,
            missing_dep: self.missing_dep,
            commit_timeout_secs: self.commit_timeout,
            no_commit_timeout_secs: self.no_commit_timeout,
            seed: self.seed,
        }
    }
}

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{error::LoadTestError, tracker::OutstandingTransactions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum Phase {
    Populate,
    Round(usize),
    MissingDependency(usize),
}

/// Submission throughput of one phase of the test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub phase: Phase,
    pub transactions: u64,
    pub elapsed_secs: f64,
    pub rate: f64,
}

impl RoundReport {
    pub fn new(phase: Phase, transactions: u64, elapsed: Duration) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        let rate = if elapsed_secs > 0.0 { transactions as f64 / elapsed_secs } else { 0.0 };
        Self { phase, transactions, elapsed_secs, rate }
    }

    pub fn log(&self) {
        if self.transactions == 0 {
            return;
        }
        info!(
            phase = ?self.phase,
            transactions = self.transactions,
            elapsed_secs = self.elapsed_secs,
            rate = self.rate,
            "sent {} transactions in {:.3}s averaging {:.2} t/s",
            self.transactions,
            self.elapsed_secs,
            self.rate
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    pub endpoints: Vec<String>,
    pub keys: usize,
    pub rounds: usize,
    pub interval_ms: u64,
    pub missing_dep: bool,
    pub commit_timeout_secs: u64,
    pub no_commit_timeout_secs: u64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub submitted: u64,
    pub confirmed: u64,
    pub outstanding: u64,
    pub keys_tracked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResults {
    pub config: TestConfig,
    pub rounds: Vec<RoundReport>,
    pub totals: Totals,
}

pub fn calculate_totals(outstanding: &OutstandingTransactions, keys_tracked: usize) -> Totals {
    Totals {
        submitted: outstanding.total_added(),
        confirmed: outstanding.total_confirmed(),
        outstanding: outstanding.size() as u64,
        keys_tracked,
    }
}

pub fn save_results(results: &TestResults, path: &Path) -> Result<(), LoadTestError> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)
        .map_err(|source| LoadTestError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "saved results");
    Ok(())
}

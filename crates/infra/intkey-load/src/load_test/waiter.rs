use std::{collections::HashSet, time::Duration};

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use intkey_client::{ServiceEndpointClient, TransactionId};
use tokio::time::{Instant, sleep_until, timeout_at};
use tracing::{debug, info, warn};

use super::{
    error::LoadTestError,
    tracker::{OutstandingTransactions, confirmed_by_all},
};

/// Deadlines and cadence for [`ConvergenceWaiter`].
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Budget for outstanding transactions to commit on every endpoint.
    pub commit_timeout: Duration,
    /// How long to watch transactions that must never commit.
    pub no_commit_timeout: Duration,
    /// Pause between polls.
    pub poll_interval: Duration,
    /// Draw a spinner while waiting.
    pub show_progress: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_secs(240),
            no_commit_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            show_progress: true,
        }
    }
}

/// Outcome of a single poll over every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub confirmed: usize,
    pub remaining: usize,
}

/// Polls endpoints until outstanding transactions drain or a deadline passes.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceWaiter {
    config: WaitConfig,
}

impl ConvergenceWaiter {
    pub const fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    /// Queries every endpoint for every outstanding transaction and drops the
    /// ones all endpoints report committed.
    pub async fn poll<C: ServiceEndpointClient>(
        &self,
        endpoints: &[C],
        outstanding: &mut OutstandingTransactions,
    ) -> PollSummary {
        let ids = outstanding.ids();
        let per_endpoint =
            join_all(endpoints.iter().map(|endpoint| committed_on(endpoint, &ids))).await;

        let confirmed = confirmed_by_all(per_endpoint);
        let remaining = outstanding.reconcile(&confirmed);
        debug!(confirmed = confirmed.len(), remaining, "polled endpoints");

        PollSummary { confirmed: confirmed.len(), remaining }
    }

    /// Waits for every outstanding transaction to commit on every endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LoadTestError::CommitTimeout`] naming the unconfirmed
    /// transactions if the commit deadline passes first.
    pub async fn wait_for_commits<C: ServiceEndpointClient>(
        &self,
        endpoints: &[C],
        outstanding: &mut OutstandingTransactions,
    ) -> Result<(), LoadTestError> {
        let timeout = self.config.commit_timeout;
        let progress = self.progress("Waiting for transactions to commit");

        let remaining = self.poll_until(endpoints, outstanding, timeout, &progress).await;
        progress.finish_and_clear();

        if remaining != 0 {
            for txn in outstanding.iter() {
                warn!(
                    id = %txn.id,
                    key = %txn.key,
                    operation = %txn.operation,
                    age_secs = txn.submitted_at.elapsed().as_secs(),
                    "transaction not committed"
                );
            }
            let pending = outstanding.ids();
            return Err(LoadTestError::CommitTimeout { count: remaining, timeout, pending });
        }

        info!("all transactions committed");
        Ok(())
    }

    /// Watches transactions that must not commit for the no-commit window.
    ///
    /// # Errors
    ///
    /// Returns [`LoadTestError::UnexpectedCommit`] if any of them committed.
    pub async fn wait_for_no_commits<C: ServiceEndpointClient>(
        &self,
        endpoints: &[C],
        outstanding: &mut OutstandingTransactions,
    ) -> Result<(), LoadTestError> {
        let timeout = self.config.no_commit_timeout;
        let starting = outstanding.size();
        let progress = self.progress("Waiting for transactions to NOT commit");

        let remaining = self.poll_until(endpoints, outstanding, timeout, &progress).await;
        progress.finish_and_clear();

        if remaining != starting {
            return Err(LoadTestError::UnexpectedCommit {
                committed: starting - remaining,
                timeout,
            });
        }

        info!(
            outstanding = remaining,
            "no transactions with missing dependencies were committed in {}s",
            timeout.as_secs()
        );
        Ok(())
    }

    async fn poll_until<C: ServiceEndpointClient>(
        &self,
        endpoints: &[C],
        outstanding: &mut OutstandingTransactions,
        timeout: Duration,
        progress: &ProgressBar,
    ) -> usize {
        let deadline = Instant::now() + timeout;
        let mut remaining = outstanding.size();

        while Instant::now() < deadline && remaining > 0 {
            progress.set_message(format!("{remaining} outstanding"));
            progress.tick();
            sleep_until(deadline.min(Instant::now() + self.config.poll_interval)).await;

            // a poll cut short by the deadline confirms nothing
            remaining = match timeout_at(deadline, self.poll(endpoints, outstanding)).await {
                Ok(summary) => summary.remaining,
                Err(_) => {
                    debug!("poll did not finish before the deadline");
                    outstanding.size()
                }
            };
        }

        remaining
    }

    fn progress(&self, prefix: &'static str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {prefix}: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(prefix);
        pb
    }
}

async fn committed_on<C: ServiceEndpointClient>(
    endpoint: &C,
    ids: &[TransactionId],
) -> HashSet<TransactionId> {
    let statuses = join_all(ids.iter().map(|id| endpoint.query_status(id))).await;
    ids.iter()
        .zip(statuses)
        .filter(|(_, status)| status.is_committed())
        .map(|(id, _)| id.clone())
        .collect()
}

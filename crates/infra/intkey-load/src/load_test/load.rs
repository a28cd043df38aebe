use std::{collections::BTreeMap, ops::RangeInclusive, time::Duration};

use intkey_client::{
    ClientConfig, HttpEndpointClient, ServiceEndpointClient, TransactionId, TransactionRequest,
};
use rand::{Rng, RngCore};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::{
    error::{LoadTestError, StateMismatch},
    metrics::{Phase, RoundReport, TestConfig, TestResults, calculate_totals},
    shadow::ShadowState,
    tracker::{OutstandingTransactions, Transaction},
    waiter::{ConvergenceWaiter, WaitConfig},
};

/// Workload parameters for [`LoadTest`].
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub wait: WaitConfig,
    /// Range initial key values are drawn from.
    pub initial_values: RangeInclusive<i64>,
    /// Amount every key is incremented by in each round.
    pub increment: i64,
    /// Amount every key is decremented by in each round, after the increments.
    pub decrement: i64,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self { wait: WaitConfig::default(), initial_values: 5..=1000, increment: 2, decrement: 1 }
    }
}

/// Drives transactions against a pool of endpoints and verifies they converge.
///
/// Keeps a shadow of the expected state and the set of transactions that have
/// not yet been committed by every endpoint.
#[derive(Debug)]
pub struct LoadTest<C, R> {
    clients: Vec<C>,
    rng: R,
    config: LoadTestConfig,
    waiter: ConvergenceWaiter,
    shadow: ShadowState,
    outstanding: OutstandingTransactions,
    reports: Vec<RoundReport>,
}

impl<R: Rng> LoadTest<HttpEndpointClient, R> {
    /// Creates one HTTP client per endpoint URL.
    ///
    /// # Errors
    ///
    /// Fails if `urls` is empty or any URL is invalid.
    pub fn connect(
        urls: &[String],
        client_config: ClientConfig,
        rng: R,
        config: LoadTestConfig,
    ) -> Result<Self, LoadTestError> {
        let clients = urls
            .iter()
            .map(|url| HttpEndpointClient::new(url.clone(), client_config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        info!(endpoints = clients.len(), "created clients");
        Self::new(clients, rng, config)
    }
}

impl<C: ServiceEndpointClient, R: Rng> LoadTest<C, R> {
    /// # Errors
    ///
    /// Returns [`LoadTestError::NoEndpoints`] if `clients` is empty.
    pub fn new(clients: Vec<C>, rng: R, config: LoadTestConfig) -> Result<Self, LoadTestError> {
        if clients.is_empty() {
            return Err(LoadTestError::NoEndpoints);
        }

        Ok(Self {
            clients,
            rng,
            waiter: ConvergenceWaiter::new(config.wait.clone()),
            config,
            shadow: ShadowState::new(),
            outstanding: OutstandingTransactions::new(),
            reports: Vec::new(),
        })
    }

    pub fn clients(&self) -> &[C] {
        &self.clients
    }

    pub const fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    pub const fn outstanding(&self) -> &OutstandingTransactions {
        &self.outstanding
    }

    /// Seeds the shadow from existing state and sets every missing key in
    /// `1..=key_count` to a random value, then waits for the sets to commit.
    pub async fn populate(&mut self, key_count: usize) -> Result<RoundReport, LoadTestError> {
        info!("checking for pre-existing state");
        let existing = self.clients[0].fetch_state().await?;
        self.shadow.extend(existing.iter().map(|(key, value)| (key.clone(), *value)));
        debug!(keys = existing.len(), "loaded pre-existing state");

        info!(key_count, "populating initial key values");
        let start = Instant::now();
        let mut sent = 0;
        for n in 1..=key_count {
            let key = n.to_string();
            if existing.contains_key(&key) {
                continue;
            }

            let value = self.rng.gen_range(self.config.initial_values.clone());
            self.shadow.set(key.clone(), value);
            self.submit(TransactionRequest::set(key, value)).await?;
            sent += 1;
        }

        let report = self.record(RoundReport::new(Phase::Populate, sent, start.elapsed()));
        self.waiter.wait_for_commits(&self.clients, &mut self.outstanding).await?;
        Ok(report)
    }

    /// Runs `rounds` rounds of increments followed by decrements over every key,
    /// waiting for each round to commit everywhere before starting the next.
    pub async fn run_rounds(
        &mut self,
        key_count: usize,
        rounds: usize,
        inter_txn_delay: Duration,
    ) -> Result<Vec<RoundReport>, LoadTestError> {
        info!(
            rounds,
            key_count,
            delay_ms = inter_txn_delay.as_millis() as u64,
            "running increment/decrement rounds"
        );

        let mut reports = Vec::with_capacity(rounds);
        for round in 0..rounds {
            self.refresh_caches().await?;
            info!(round, "starting round");

            let start = Instant::now();
            let mut sent = 0;
            for n in 1..=key_count {
                let key = n.to_string();
                self.shadow.adjust(&key, self.config.increment)?;
                self.submit(TransactionRequest::increment(key, self.config.increment)).await?;
                sent += 1;
                pause(inter_txn_delay).await;
            }
            for n in 1..=key_count {
                let key = n.to_string();
                self.shadow.adjust(&key, -self.config.decrement)?;
                self.submit(TransactionRequest::decrement(key, self.config.decrement)).await?;
                sent += 1;
                pause(inter_txn_delay).await;
            }

            reports.push(self.record(RoundReport::new(Phase::Round(round), sent, start.elapsed())));
            self.waiter.wait_for_commits(&self.clients, &mut self.outstanding).await?;
        }

        Ok(reports)
    }

    /// Submits, for every key, an increment that depends on a transaction
    /// that is never posted, and verifies none of them commit.
    ///
    /// The shadow is left untouched. The dependent transactions stay
    /// outstanding afterwards, so this should run after the commit rounds.
    pub async fn run_with_missing_dependency(
        &mut self,
        key_count: usize,
        rounds: usize,
    ) -> Result<(), LoadTestError> {
        info!(rounds, key_count, "running rounds with missing dependencies");

        for round in 1..=rounds {
            self.refresh_caches().await?;
            info!(round, "starting missing dependency round");

            let start = Instant::now();
            let mut sent = 0;
            for n in 1..=key_count {
                let key = n.to_string();
                let missing = self.unposted_id();
                debug!(%key, %missing, "depending on unposted transaction");
                self.submit(TransactionRequest::increment(key, 1).depends_on(missing)).await?;
                sent += 1;
            }

            self.record(RoundReport::new(Phase::MissingDependency(round), sent, start.elapsed()));
            self.waiter.wait_for_no_commits(&self.clients, &mut self.outstanding).await?;
        }

        Ok(())
    }

    /// Compares the authoritative state of the first endpoint with the shadow.
    ///
    /// # Errors
    ///
    /// Returns [`LoadTestError::StateMismatch`] listing every divergent key.
    pub async fn validate(&self) -> Result<(), LoadTestError> {
        let state = self.clients[0].fetch_state().await?;
        info!(keys = state.len(), "validating state");

        let mismatches: Vec<_> = state
            .into_iter()
            .filter_map(|(key, actual)| {
                let expected = self.shadow.get(&key).ok();
                (expected != Some(actual)).then_some(StateMismatch { key, expected, actual })
            })
            .collect();

        if mismatches.is_empty() {
            return Ok(());
        }
        for mismatch in &mismatches {
            warn!("{mismatch}");
        }
        Err(LoadTestError::StateMismatch(mismatches))
    }

    /// Fetches and logs the authoritative state of the first endpoint.
    pub async fn ledger_state(&self) -> Result<BTreeMap<String, i64>, LoadTestError> {
        let state = self.clients[0].fetch_state().await?;
        for (key, value) in &state {
            info!(%key, value, "ledger state");
        }
        Ok(state)
    }

    pub fn results(&self, config: TestConfig) -> TestResults {
        TestResults {
            config,
            rounds: self.reports.clone(),
            totals: calculate_totals(&self.outstanding, self.shadow.len()),
        }
    }

    /// Submits via a uniformly chosen client and tracks the resulting transaction.
    async fn submit(&mut self, request: TransactionRequest) -> Result<TransactionId, LoadTestError> {
        let index = self.rng.gen_range(0..self.clients.len());
        let client = &self.clients[index];
        let key = request.key.clone();
        let operation = request.operation;
        let dependency = request.dependency.clone();

        let Some(id) = client.submit(request).await? else {
            return Err(LoadTestError::Submission {
                key,
                operation,
                endpoint: client.url().to_string(),
            });
        };

        self.outstanding.add(Transaction {
            id: id.clone(),
            key,
            operation,
            dependency,
            submitted_at: Instant::now(),
        });
        Ok(id)
    }

    async fn refresh_caches(&self) -> Result<(), LoadTestError> {
        for client in &self.clients {
            client.refresh_cache().await?;
        }
        Ok(())
    }

    fn unposted_id(&mut self) -> TransactionId {
        TransactionId::new(format!("{:016x}{:016x}", self.rng.next_u64(), self.rng.next_u64()))
    }

    fn record(&mut self, report: RoundReport) -> RoundReport {
        report.log();
        self.reports.push(report.clone());
        report
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

//! In-memory integer-key network used by the scenario tests.

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use intkey_client::{
    ClientError, Operation, ServiceEndpointClient, TransactionId, TransactionRequest,
    TransactionStatus,
};

#[derive(Debug)]
struct Ledger {
    next_id: u64,
    state: BTreeMap<String, i64>,
    committed: HashSet<TransactionId>,
    pending: HashMap<TransactionId, TransactionRequest>,
    stalled_keys: HashSet<String>,
    ignore_dependencies: bool,
}

impl Ledger {
    /// Commits a transaction when its dependency has committed and its key is not stalled.
    fn try_commit(&mut self, id: &TransactionId) {
        let Some(request) = self.pending.get(id) else {
            return;
        };
        if self.stalled_keys.contains(&request.key) {
            return;
        }
        if let Some(dependency) = &request.dependency {
            if !self.ignore_dependencies && !self.committed.contains(dependency) {
                return;
            }
        }

        let request = self.pending.remove(id).expect("pending entry checked above");
        let value = self.state.entry(request.key).or_insert(0);
        match request.operation {
            Operation::Set => *value = request.value,
            Operation::Increment => *value += request.value,
            Operation::Decrement => *value -= request.value,
        }
        self.committed.insert(id.clone());
    }
}

/// A replicated service shared by every [`MockEndpoint`] created from it.
#[derive(Debug, Clone)]
pub struct MockNetwork {
    ledger: Arc<Mutex<Ledger>>,
    reject_submissions: Arc<AtomicBool>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::with_state(BTreeMap::new())
    }

    pub fn with_state(state: BTreeMap<String, i64>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger {
                next_id: 0,
                state,
                committed: HashSet::new(),
                pending: HashMap::new(),
                stalled_keys: HashSet::new(),
                ignore_dependencies: false,
            })),
            reject_submissions: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn endpoints(&self, count: usize) -> Vec<MockEndpoint> {
        (0..count)
            .map(|i| MockEndpoint {
                url: format!("mock://validator-{i}"),
                network: self.clone(),
                lagging: Arc::new(AtomicBool::new(false)),
                refreshes: Arc::new(AtomicUsize::new(0)),
            })
            .collect()
    }

    /// Transactions on `key` stay pending forever.
    pub fn stall_key(&self, key: &str) {
        self.ledger.lock().unwrap().stalled_keys.insert(key.to_string());
    }

    /// Commits dependent transactions without waiting for their dependency.
    pub fn ignore_dependencies(&self) {
        self.ledger.lock().unwrap().ignore_dependencies = true;
    }

    /// Submissions are accepted but no transaction id is assigned.
    pub fn reject_submissions(&self) {
        self.reject_submissions.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> BTreeMap<String, i64> {
        self.ledger.lock().unwrap().state.clone()
    }

    /// Overwrites a committed value behind the driver's back.
    pub fn tamper(&self, key: &str, value: i64) {
        self.ledger.lock().unwrap().state.insert(key.to_string(), value);
    }

    pub fn committed_count(&self) -> usize {
        self.ledger.lock().unwrap().committed.len()
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.lock().unwrap().pending.len()
    }
}

/// One validator of a [`MockNetwork`].
#[derive(Debug)]
pub struct MockEndpoint {
    url: String,
    network: MockNetwork,
    lagging: Arc<AtomicBool>,
    refreshes: Arc<AtomicUsize>,
}

impl MockEndpoint {
    /// This validator reports every transaction as pending.
    pub fn set_lagging(&self, lagging: bool) {
        self.lagging.store(lagging, Ordering::SeqCst);
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceEndpointClient for MockEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn submit(
        &self,
        request: TransactionRequest,
    ) -> Result<Option<TransactionId>, ClientError> {
        if self.network.reject_submissions.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let mut ledger = self.network.ledger.lock().unwrap();
        ledger.next_id += 1;
        let id = TransactionId::new(format!("txn-{:04}", ledger.next_id));
        ledger.pending.insert(id.clone(), request);
        ledger.try_commit(&id);
        Ok(Some(id))
    }

    async fn query_status(&self, id: &TransactionId) -> TransactionStatus {
        let ledger = self.network.ledger.lock().unwrap();
        if ledger.committed.contains(id) {
            if self.lagging.load(Ordering::SeqCst) {
                TransactionStatus::Pending
            } else {
                TransactionStatus::Committed
            }
        } else if ledger.pending.contains_key(id) {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Unknown
        }
    }

    async fn fetch_state(&self) -> Result<BTreeMap<String, i64>, ClientError> {
        Ok(self.network.state())
    }

    async fn refresh_cache(&self) -> Result<(), ClientError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

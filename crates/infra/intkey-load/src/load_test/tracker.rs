use std::collections::{HashMap, HashSet};

use intkey_client::{Operation, TransactionId};
use tokio::time::Instant;

/// A submitted transaction that has not yet been confirmed by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub key: String,
    pub operation: Operation,
    pub dependency: Option<TransactionId>,
    pub submitted_at: Instant,
}

/// Transactions submitted but not yet committed on all endpoints.
#[derive(Debug, Default)]
pub struct OutstandingTransactions {
    // Pending transactions (id -> transaction)
    pending: HashMap<TransactionId, Transaction>,

    // Lifetime counters
    total_added: u64,
    total_confirmed: u64,
}

impl OutstandingTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pending transaction. Returns `false` if the id was already tracked.
    pub fn add(&mut self, txn: Transaction) -> bool {
        if self.pending.contains_key(&txn.id) {
            return false;
        }
        self.total_added += 1;
        self.pending.insert(txn.id.clone(), txn);
        true
    }

    /// Removes every transaction in `confirmed` and returns the remaining count.
    pub fn reconcile<'a>(
        &mut self,
        confirmed: impl IntoIterator<Item = &'a TransactionId>,
    ) -> usize {
        for id in confirmed {
            if self.pending.remove(id).is_some() {
                self.total_confirmed += 1;
            }
        }
        self.pending.len()
    }

    pub fn size(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.pending.contains_key(id)
    }

    /// Outstanding ids in ascending order.
    pub fn ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self.pending.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.pending.values()
    }

    pub fn total_added(&self) -> u64 {
        self.total_added
    }

    pub fn total_confirmed(&self) -> u64 {
        self.total_confirmed
    }
}

/// Ids reported committed by every endpoint: the intersection of per-endpoint sets.
pub fn confirmed_by_all(per_endpoint: Vec<HashSet<TransactionId>>) -> HashSet<TransactionId> {
    let mut sets = per_endpoint.into_iter();
    let Some(first) = sets.next() else {
        return HashSet::new();
    };
    sets.fold(first, |acc, set| acc.intersection(&set).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(id: &str) -> Transaction {
        Transaction {
            id: id.into(),
            key: "1".to_string(),
            operation: Operation::Increment,
            dependency: None,
            submitted_at: Instant::now(),
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut outstanding = OutstandingTransactions::new();
        assert!(outstanding.add(txn("a")));
        assert!(!outstanding.add(txn("a")));
        assert_eq!(outstanding.size(), 1);
        assert_eq!(outstanding.total_added(), 1);
    }

    #[test]
    fn test_reconcile_removes_confirmed() {
        let mut outstanding = OutstandingTransactions::new();
        for id in ["a", "b", "c"] {
            outstanding.add(txn(id));
        }
        let confirmed: Vec<TransactionId> = vec!["a".into(), "c".into(), "zz".into()];
        assert_eq!(outstanding.reconcile(&confirmed), 1);
        assert_eq!(outstanding.ids(), vec![TransactionId::from("b")]);
        assert_eq!(outstanding.total_confirmed(), 2);
    }

    #[test]
    fn test_reconcile_twice_matches_once() {
        let mut once = OutstandingTransactions::new();
        let mut twice = OutstandingTransactions::new();
        for id in ["a", "b", "c", "d"] {
            once.add(txn(id));
            twice.add(txn(id));
        }
        let confirmed: Vec<TransactionId> = vec!["b".into(), "d".into()];

        once.reconcile(&confirmed);
        twice.reconcile(&confirmed);
        twice.reconcile(&confirmed);

        assert_eq!(once.ids(), twice.ids());
        assert_eq!(once.total_confirmed(), twice.total_confirmed());
    }

    #[test]
    fn test_confirmed_by_all_intersects() {
        let endpoint = |ids: &[&str]| ids.iter().map(|id| TransactionId::from(*id)).collect();
        let merged = confirmed_by_all(vec![
            endpoint(&["a", "b", "c"]),
            endpoint(&["a", "c"]),
            endpoint(&["c", "a", "x"]),
        ]);
        let mut merged: Vec<_> = merged.into_iter().collect();
        merged.sort();
        assert_eq!(merged, vec![TransactionId::from("a"), TransactionId::from("c")]);

        assert!(confirmed_by_all(Vec::new()).is_empty());
    }
}

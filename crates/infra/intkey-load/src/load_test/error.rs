use std::{fmt, io, path::PathBuf, time::Duration};

use intkey_client::{ClientError, Operation, TransactionId};
use thiserror::Error;

/// A key whose shadow value differs from the authoritative value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMismatch {
    pub key: String,
    /// Shadow value, `None` when the key was never tracked locally.
    pub expected: Option<i64>,
    pub actual: i64,
}

impl fmt::Display for StateMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            Some(expected) => {
                write!(f, "key {} is {} expected to be {}", self.key, self.actual, expected)
            }
            None => write!(f, "key {} is {} but was never tracked", self.key, self.actual),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("failed to {operation} key {key} via {endpoint}: no transaction id returned")]
    Submission { key: String, operation: Operation, endpoint: String },

    #[error("{count} transactions failed to commit in {}s: {}", .timeout.as_secs(), join_ids(.pending))]
    CommitTimeout { count: usize, timeout: Duration, pending: Vec<TransactionId> },

    #[error("{committed} transactions with missing dependencies were committed in {}s", .timeout.as_secs())]
    UnexpectedCommit { committed: usize, timeout: Duration },

    #[error("key {0} is not tracked in the shadow state")]
    UnknownKey(String),

    #[error("adjusting key {key} by {delta} overflows its value {value}")]
    Overflow { key: String, value: i64, delta: i64 },

    #[error("state validation failed: {}", join_mismatches(.0))]
    StateMismatch(Vec<StateMismatch>),

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to serialize results")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write results to {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn join_ids(ids: &[TransactionId]) -> String {
    ids.iter().map(TransactionId::as_str).collect::<Vec<_>>().join(", ")
}

fn join_mismatches(mismatches: &[StateMismatch]) -> String {
    mismatches.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

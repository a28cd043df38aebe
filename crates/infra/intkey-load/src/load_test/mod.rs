/// CLI argument parsing for the load test.
pub mod config;

/// Error taxonomy of a load test run.
mod error;
pub use error::{LoadTestError, StateMismatch};

/// Load test orchestrator.
pub mod load;
pub use load::{LoadTest, LoadTestConfig};

/// Throughput reports and results output.
pub mod metrics;

/// Locally predicted key/value state.
mod shadow;
pub use shadow::ShadowState;

/// Outstanding transaction bookkeeping.
mod tracker;
pub use tracker::{OutstandingTransactions, Transaction, confirmed_by_all};

/// Bounded-time commit polling.
mod waiter;
pub use waiter::{ConvergenceWaiter, PollSummary, WaitConfig};

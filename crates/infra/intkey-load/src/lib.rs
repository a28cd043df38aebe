#![doc = include_str!("../README.md")]

/// Load testing framework.
pub mod load_test;

pub use load_test::{
    ConvergenceWaiter, LoadTest, LoadTestConfig, LoadTestError, OutstandingTransactions,
    ShadowState, WaitConfig,
};

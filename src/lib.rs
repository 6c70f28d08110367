//! zero-bot library
//!
//! Per-account testnet automation: faucet mints, random router swaps and
//! storage uploads, each transaction sent through one retry policy and one
//! submitter that reconciles late confirmations by receipt lookup.

pub mod chain;
pub mod config;
pub mod driver;
pub mod errors;
pub mod executors;
pub mod metrics;
pub mod proxy;
pub mod results;
pub mod retry;
pub mod storage;
pub mod structured_logging;
pub mod submitter;
pub mod wallet;

pub mod test_utils;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use driver::{BatchDriver, BatchReport, Phases};
pub use errors::{BotError, BotResult};
pub use retry::{retry_with_backoff, RetryDecision, RetryPolicy};
pub use submitter::{TxOutcome, TxSubmitter};

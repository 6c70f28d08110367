//! Chain access seam.
//!
//! Executors and the submitter talk to the chain exclusively through
//! [`ChainClient`], one instance per account. The production implementation
//! wraps an alloy provider with the account's wallet ([`provider`]); tests
//! use the scriptable mock from `test_utils`.

pub mod contracts;
pub mod provider;

use crate::errors::BotResult;
use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use provider::{AlloyChainClient, AlloyConnector};

/// Unsigned call to be signed and sent from the client's account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub input: Bytes,
    /// None lets the provider estimate
    pub gas_limit: Option<u64>,
}

impl TxRequest {
    pub fn new(to: Address, input: impl Into<Bytes>) -> Self {
        Self {
            to,
            input: input.into(),
            gas_limit: None,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

/// The parts of a receipt this bot looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address transactions are sent from
    fn address(&self) -> Address;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, input: Bytes) -> BotResult<Bytes>;

    /// Sign and broadcast; returns once the node accepted the transaction
    async fn send(&self, request: TxRequest) -> BotResult<TxHash>;

    /// Wait for inclusion. Must yield `BotError::ConfirmationTimeout` when
    /// `timeout` elapses first.
    async fn wait_for_receipt(&self, tx_hash: TxHash, timeout: Option<Duration>)
        -> BotResult<TxReceipt>;

    /// Direct receipt lookup, `None` while pending or unknown
    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<TxReceipt>>;
}

/// Builds a per-account client. Kept separate so the driver can be exercised
/// without a node.
pub trait ChainConnector {
    type Client: ChainClient;

    fn connect(&self, account: &crate::wallet::Account) -> BotResult<Self::Client>;
}

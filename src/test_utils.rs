//! Test Utilities Module
//!
//! A scriptable in-memory [`ChainClient`] so executors, the submitter and
//! the driver can be exercised without a node.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use crate::chain::contracts::IERC20;
use crate::chain::{ChainClient, ChainConnector, TxReceipt, TxRequest};
use crate::config::Config;
use crate::errors::{BotError, BotResult};
use crate::wallet::Account;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// How a scripted confirmation wait resolves
#[derive(Debug, Clone)]
pub enum WaitBehavior {
    Confirm { block: u64 },
    Revert { block: u64 },
    Timeout,
    Error(BotError),
}

#[derive(Default)]
struct MockState {
    send_script: VecDeque<BotResult<()>>,
    wait_script: VecDeque<WaitBehavior>,
    receipt_script: VecDeque<Option<(bool, u64)>>,
    balances: HashMap<Address, U256>,
    allowances: HashMap<Address, U256>,
    failing_reads: HashSet<Address>,
    sent: Vec<TxRequest>,
    receipt_lookups: usize,
    next_block: u64,
}

/// Mock chain client
///
/// Unscripted sends succeed and unscripted waits confirm in increasing
/// blocks. Scripts are consumed front to back.
#[derive(Clone)]
pub struct MockChain {
    address: Address,
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(MockState {
                next_block: 100,
                ..Default::default()
            })),
        }
    }

    pub fn push_send(&self, result: BotResult<()>) -> &Self {
        self.state.lock().send_script.push_back(result);
        self
    }

    /// Fail the next `n` sends with an HTTP 502
    pub fn fail_sends_with_502(&self, n: usize) -> &Self {
        for _ in 0..n {
            self.push_send(Err(gateway_error()));
        }
        self
    }

    pub fn push_wait(&self, behavior: WaitBehavior) -> &Self {
        self.state.lock().wait_script.push_back(behavior);
        self
    }

    /// Script the next direct receipt lookup: `Some((success, block))` or pending
    pub fn push_receipt(&self, receipt: Option<(bool, u64)>) -> &Self {
        self.state.lock().receipt_script.push_back(receipt);
        self
    }

    pub fn set_balance(&self, token: Address, balance: U256) -> &Self {
        self.state.lock().balances.insert(token, balance);
        self
    }

    pub fn set_allowance(&self, token: Address, allowance: U256) -> &Self {
        self.state.lock().allowances.insert(token, allowance);
        self
    }

    /// Make every `eth_call` against `token` fail
    pub fn fail_reads(&self, token: Address) -> &Self {
        self.state.lock().failing_reads.insert(token);
        self
    }

    /// Every request passed to `send`, including rejected ones
    pub fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().sent.clone()
    }

    pub fn send_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    pub fn receipt_lookups(&self) -> usize {
        self.state.lock().receipt_lookups
    }

    fn hash_for(n: usize) -> TxHash {
        TxHash::from(U256::from(n).to_be_bytes::<32>())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn address(&self) -> Address {
        self.address
    }

    async fn call(&self, to: Address, input: Bytes) -> BotResult<Bytes> {
        let state = self.state.lock();
        if state.failing_reads.contains(&to) {
            return Err(BotError::from_rpc_message("call reverted"));
        }

        let value = match input.get(..4) {
            Some(s) if s == IERC20::balanceOfCall::SELECTOR => {
                state.balances.get(&to).copied().unwrap_or_default()
            }
            Some(s) if s == IERC20::allowanceCall::SELECTOR => {
                state.allowances.get(&to).copied().unwrap_or_default()
            }
            _ => return Err(BotError::from_rpc_message("unsupported call")),
        };
        Ok(Bytes::from(value.to_be_bytes::<32>().to_vec()))
    }

    async fn send(&self, request: TxRequest) -> BotResult<TxHash> {
        let mut state = self.state.lock();
        state.sent.push(request);
        let n = state.sent.len();
        match state.send_script.pop_front() {
            Some(Err(e)) => Err(e),
            _ => Ok(Self::hash_for(n)),
        }
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Option<Duration>,
    ) -> BotResult<TxReceipt> {
        let mut state = self.state.lock();
        let behavior = match state.wait_script.pop_front() {
            Some(behavior) => behavior,
            None => {
                state.next_block += 1;
                WaitBehavior::Confirm {
                    block: state.next_block,
                }
            }
        };

        match behavior {
            WaitBehavior::Confirm { block } => Ok(receipt(tx_hash, true, block)),
            WaitBehavior::Revert { block } => Ok(receipt(tx_hash, false, block)),
            WaitBehavior::Timeout => Err(BotError::ConfirmationTimeout {
                tx_hash,
                timeout_secs: timeout.map(|t| t.as_secs()).unwrap_or_default(),
                link: String::new(),
            }),
            WaitBehavior::Error(e) => Err(e),
        }
    }

    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<TxReceipt>> {
        let mut state = self.state.lock();
        state.receipt_lookups += 1;
        Ok(state
            .receipt_script
            .pop_front()
            .flatten()
            .map(|(success, block)| receipt(tx_hash, success, block)))
    }
}

fn receipt(tx_hash: TxHash, success: bool, block: u64) -> TxReceipt {
    TxReceipt {
        tx_hash,
        block_number: Some(block),
        success,
        gas_used: 21_000,
    }
}

pub fn gateway_error() -> BotError {
    BotError::from_rpc_message("server returned an error response: 502 Bad Gateway")
}

/// Hands out pre-built mocks by account index; accounts listed in
/// `unreachable` fail to connect.
#[derive(Clone, Default)]
pub struct MockConnector {
    chains: Arc<Mutex<HashMap<usize, MockChain>>>,
    unreachable: Arc<Mutex<HashSet<usize>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_for(&self, account: &Account) -> MockChain {
        self.chains
            .lock()
            .entry(account.index())
            .or_insert_with(|| MockChain::new(account.address()))
            .clone()
    }

    pub fn set_unreachable(&self, index: usize) {
        self.unreachable.lock().insert(index);
    }
}

impl ChainConnector for MockConnector {
    type Client = MockChain;

    fn connect(&self, account: &Account) -> BotResult<MockChain> {
        if self.unreachable.lock().contains(&account.index()) {
            return Err(BotError::Configuration(format!(
                "account #{} unreachable",
                account.index()
            )));
        }
        Ok(self.chain_for(account))
    }
}

/// Anvil dev keys, one per line
pub const TEST_KEYS: [&str; 3] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub fn test_accounts(n: usize) -> Vec<Account> {
    crate::wallet::parse_accounts(&TEST_KEYS[..n.min(TEST_KEYS.len())].join("\n"))
}

/// Default config with every delay and backoff zeroed
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.mint.delay_ms = 0;
    config.swap.delay_ms = 0;
    config.storage.file_delay_ms = 0;
    config.schedule.account_delay_ms = 0;
    for profile in [
        &mut config.retry.mint,
        &mut config.retry.approve,
        &mut config.retry.swap,
        &mut config.retry.upload,
    ] {
        profile.backoff_min_ms = 0;
        profile.backoff_max_ms = 0;
    }
    config
}

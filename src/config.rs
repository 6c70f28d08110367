//! Configuration module for the zero-bot
//!
//! This module handles configuration loading from TOML files and environment
//! variables. Every field carries a serde default, so a partial file (or no
//! file at all) yields the Galileo testnet setup.

use crate::errors::BotError;
use crate::retry::RetryPolicy;
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub files: FilesConfig,

    /// Faucet tokens, also the swap universe
    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenConfig>,

    #[serde(default)]
    pub mint: MintConfig,

    #[serde(default)]
    pub swap: SwapConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Per call site retry/timeout records
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Explorer prefix; the transaction hash is appended
    #[serde(default = "default_explorer_tx_url")]
    pub explorer_tx_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_key_file")]
    pub key_file: String,

    #[serde(default = "default_proxy_file")]
    pub proxy_file: String,

    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Dump confirmed transactions as JSON under `results_dir`
    #[serde(default)]
    pub save_results: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay after each token mint, whatever the outcome
    #[serde(default = "default_mint_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_router")]
    pub router: Address,

    /// Pool fee tier (uint24)
    #[serde(default = "default_fee")]
    pub fee: u32,

    #[serde(default = "default_min_swaps")]
    pub min_swaps: u32,

    #[serde(default = "default_max_swaps")]
    pub max_swaps: u32,

    /// amountIn = balance / divisor
    #[serde(default = "default_amount_divisor")]
    pub amount_divisor: u64,

    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// No slippage protection on the testnet by default
    #[serde(default)]
    pub amount_out_minimum: u128,

    #[serde(default = "default_swap_delay_ms")]
    pub delay_ms: u64,
}

/// Storage contract deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageVariant {
    #[default]
    Turbo,
    Standard,
}

impl StorageVariant {
    pub fn contract(&self) -> Address {
        match self {
            StorageVariant::Turbo => address!("5f1D96895e442FC0168FA2F9fb1EBeF93Cb5035e"),
            StorageVariant::Standard => address!("56A565685C9992BF5ACafb940ff68922980DBBC5"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,

    #[serde(default)]
    pub variant: StorageVariant,

    /// Explicit contract address; overrides `variant`
    #[serde(default)]
    pub contract: Option<Address>,

    #[serde(default = "default_image_sources")]
    pub image_sources: Vec<String>,

    #[serde(default = "default_min_files")]
    pub min_files: u32,

    #[serde(default = "default_max_files")]
    pub max_files: u32,

    #[serde(default = "default_file_delay_ms")]
    pub file_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_account_delay_ms")]
    pub account_delay_ms: u64,

    #[serde(default = "default_batch_interval_secs")]
    pub batch_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// Retry ceiling, backoff window, confirmation timeout and gas limit for
/// one kind of submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionProfile {
    pub max_attempts: u32,

    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Retry errors other than gateway failures
    #[serde(default)]
    pub retry_non_transient: bool,

    /// None waits for inclusion without a client-side bound
    #[serde(default)]
    pub confirmation_timeout_secs: Option<u64>,

    #[serde(default)]
    pub gas_limit: Option<u64>,
}

impl SubmissionProfile {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_min: Duration::from_millis(self.backoff_min_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
            retry_non_transient: self.retry_non_transient,
        }
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_mint_profile")]
    pub mint: SubmissionProfile,

    #[serde(default = "default_approve_profile")]
    pub approve: SubmissionProfile,

    #[serde(default = "default_swap_profile")]
    pub swap: SubmissionProfile,

    #[serde(default = "default_upload_profile")]
    pub upload: SubmissionProfile,
}

// Default value functions
fn default_rpc_url() -> String { "https://evmrpc-testnet.0g.ai".to_string() }
fn default_explorer_tx_url() -> String { "https://chainscan-galileo.0g.ai/tx/".to_string() }
fn default_key_file() -> String { "wallet.txt".to_string() }
fn default_proxy_file() -> String { "proxies.txt".to_string() }
fn default_results_dir() -> String { "results".to_string() }
fn default_true() -> bool { true }
fn default_mint_delay_ms() -> u64 { 2_000 }
fn default_router() -> Address { address!("16a811adc55A99b4456F62c54F12D3561559a268") }
fn default_fee() -> u32 { 3_000 }
fn default_min_swaps() -> u32 { 3 }
fn default_max_swaps() -> u32 { 5 }
fn default_amount_divisor() -> u64 { 10 }
fn default_deadline_secs() -> u64 { 600 }
fn default_swap_delay_ms() -> u64 { 5_000 }
fn default_indexer_url() -> String { "https://indexer-storage-testnet-turbo.0g.ai".to_string() }
fn default_min_files() -> u32 { 4 }
fn default_max_files() -> u32 { 6 }
fn default_file_delay_ms() -> u64 { 3_000 }
fn default_account_delay_ms() -> u64 { 10_000 }
fn default_batch_interval_secs() -> u64 { 24 * 60 * 60 }
fn default_http_timeout() -> u64 { 30 }
fn default_backoff_min_ms() -> u64 { 2_000 }
fn default_backoff_max_ms() -> u64 { 4_000 }

fn default_image_sources() -> Vec<String> {
    vec![
        "https://picsum.photos/800/600".to_string(),
        "https://loremflickr.com/800/600".to_string(),
    ]
}

fn default_tokens() -> Vec<TokenConfig> {
    vec![
        TokenConfig {
            symbol: "ETH".to_string(),
            address: address!("2619090fcfdb99a8ccf51c76c9467f7375040eeb"),
        },
        TokenConfig {
            symbol: "BTC".to_string(),
            address: address!("6dc29491a8396bd52376b4f6da1f3e889c16ca85"),
        },
        TokenConfig {
            symbol: "USDT".to_string(),
            address: address!("a8f030218d7c26869cadd46c5f10129e635cd565"),
        },
    ]
}

fn profile(max_attempts: u32, timeout_secs: Option<u64>, gas_limit: Option<u64>) -> SubmissionProfile {
    SubmissionProfile {
        max_attempts,
        backoff_min_ms: default_backoff_min_ms(),
        backoff_max_ms: default_backoff_max_ms(),
        retry_non_transient: false,
        confirmation_timeout_secs: timeout_secs,
        gas_limit,
    }
}

fn default_mint_profile() -> SubmissionProfile { profile(1, None, Some(300_000)) }
fn default_approve_profile() -> SubmissionProfile { profile(3, None, None) }
fn default_swap_profile() -> SubmissionProfile { profile(3, None, None) }

fn default_upload_profile() -> SubmissionProfile {
    SubmissionProfile {
        retry_non_transient: true,
        ..profile(5, Some(120), Some(500_000))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            explorer_tx_url: default_explorer_tx_url(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            proxy_file: default_proxy_file(),
            results_dir: default_results_dir(),
            save_results: false,
        }
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: default_mint_delay_ms(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            router: default_router(),
            fee: default_fee(),
            min_swaps: default_min_swaps(),
            max_swaps: default_max_swaps(),
            amount_divisor: default_amount_divisor(),
            deadline_secs: default_deadline_secs(),
            amount_out_minimum: 0,
            delay_ms: default_swap_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            indexer_url: default_indexer_url(),
            variant: StorageVariant::default(),
            contract: None,
            image_sources: default_image_sources(),
            min_files: default_min_files(),
            max_files: default_max_files(),
            file_delay_ms: default_file_delay_ms(),
        }
    }
}

impl StorageConfig {
    pub fn contract_address(&self) -> Address {
        self.contract.unwrap_or_else(|| self.variant.contract())
    }

    pub fn files_range(&self) -> RangeInclusive<u32> {
        self.min_files..=self.max_files
    }
}

impl SwapConfig {
    pub fn swaps_range(&self) -> RangeInclusive<u32> {
        self.min_swaps..=self.max_swaps
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            account_delay_ms: default_account_delay_ms(),
            batch_interval_secs: default_batch_interval_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            mint: default_mint_profile(),
            approve: default_approve_profile(),
            swap: default_swap_profile(),
            upload: default_upload_profile(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            files: FilesConfig::default(),
            tokens: default_tokens(),
            mint: MintConfig::default(),
            swap: SwapConfig::default(),
            storage: StorageConfig::default(),
            schedule: ScheduleConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    /// `ZERO_BOT_RPC_URL`, `ZERO_BOT_KEY_FILE` and `ZERO_BOT_PROXY_FILE`
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ZERO_BOT_RPC_URL") {
            self.network.rpc_url = url;
        }
        if let Ok(path) = std::env::var("ZERO_BOT_KEY_FILE") {
            self.files.key_file = path;
        }
        if let Ok(path) = std::env::var("ZERO_BOT_PROXY_FILE") {
            self.files.proxy_file = path;
        }
    }

    pub fn validate(&self) -> Result<(), BotError> {
        reqwest::Url::parse(&self.network.rpc_url).map_err(|e| {
            BotError::Configuration(format!("invalid rpc_url '{}': {}", self.network.rpc_url, e))
        })?;

        if self.tokens.len() < 2 {
            return Err(BotError::Configuration(
                "at least two tokens are required".to_string(),
            ));
        }
        if self.swap.min_swaps > self.swap.max_swaps {
            return Err(BotError::Configuration(format!(
                "swap range inverted: {} > {}",
                self.swap.min_swaps, self.swap.max_swaps
            )));
        }
        if self.storage.min_files > self.storage.max_files {
            return Err(BotError::Configuration(format!(
                "file range inverted: {} > {}",
                self.storage.min_files, self.storage.max_files
            )));
        }
        if self.storage.enabled && self.storage.image_sources.is_empty() {
            return Err(BotError::Configuration(
                "storage enabled without image sources".to_string(),
            ));
        }
        if self.swap.fee >= 1 << 24 {
            return Err(BotError::Configuration(format!(
                "fee {} exceeds uint24",
                self.swap.fee
            )));
        }
        if self.swap.amount_divisor == 0 {
            return Err(BotError::Configuration("amount_divisor must be > 0".to_string()));
        }

        for (name, profile) in [
            ("mint", &self.retry.mint),
            ("approve", &self.retry.approve),
            ("swap", &self.retry.swap),
            ("upload", &self.retry.upload),
        ] {
            if profile.max_attempts == 0 {
                return Err(BotError::Configuration(format!(
                    "retry.{}.max_attempts must be >= 1",
                    name
                )));
            }
            if profile.backoff_min_ms > profile.backoff_max_ms {
                return Err(BotError::Configuration(format!(
                    "retry.{} backoff window inverted",
                    name
                )));
            }
        }

        Ok(())
    }
}

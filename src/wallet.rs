//! Wallet loading module

use crate::errors::{BotError, BotResult};
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroize;

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("valid key pattern"));

/// A private key and the address derived from it
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    /// 1-based position in the key file, for logs
    index: usize,
}

impl Account {
    /// Parse a `0x`-prefixed or bare 64 hex digit key
    pub fn from_hex(key: &str, index: usize) -> BotResult<Self> {
        let mut normalized = if key.starts_with("0x") {
            key.to_string()
        } else {
            format!("0x{}", key)
        };

        if !KEY_PATTERN.is_match(&normalized) {
            normalized.zeroize();
            return Err(BotError::Configuration(format!(
                "line {}: not a 64 hex digit private key",
                index
            )));
        }

        let mut raw = [0u8; 32];
        let decoded = hex::decode_to_slice(&normalized[2..], &mut raw);
        normalized.zeroize();
        decoded.map_err(|e| BotError::Configuration(format!("line {}: {}", index, e)))?;

        let signer = PrivateKeySigner::from_bytes(&B256::from(raw))
            .map_err(|e| BotError::Configuration(format!("line {}: {}", index, e)));
        raw.zeroize();

        Ok(Self {
            signer: signer?,
            index,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("address", &self.address())
            .finish()
    }
}

/// Parse key file contents. Blank lines are ignored, malformed lines are
/// dropped with a warning.
pub fn parse_accounts(content: &str) -> Vec<Account> {
    let mut accounts = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match Account::from_hex(line, line_no + 1) {
            Ok(account) => accounts.push(account),
            Err(e) => warn!("Skipping invalid private key: {}", e),
        }
    }

    accounts
}

/// Load accounts from a key file. A missing file or a file without a single
/// valid key is a configuration error.
pub fn load_accounts(path: impl AsRef<Path>) -> BotResult<Vec<Account>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BotError::Configuration(format!(
            "{} file not found",
            path.display()
        )));
    }

    let mut content = std::fs::read_to_string(path).map_err(|e| {
        BotError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;
    let accounts = parse_accounts(&content);
    content.zeroize();

    if accounts.is_empty() {
        return Err(BotError::Configuration(format!(
            "no valid private keys found in {}",
            path.display()
        )));
    }

    info!("🔵 Loaded {} private key(s) from {}", accounts.len(), path.display());
    Ok(accounts)
}

//! Structured logging for the transaction lifecycle

use alloy::primitives::{Address, TxHash};
use uuid::Uuid;

/// Builds `<explorer base><tx hash>` links
#[derive(Debug, Clone)]
pub struct ExplorerLink {
    base: String,
}

impl ExplorerLink {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn tx(&self, tx_hash: &TxHash) -> String {
        format!("{}{}", self.base, tx_hash)
    }
}

/// Structured logger for transaction events, tagged with the pass id and
/// the sending account
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context_id: String,
    account: Address,
}

impl StructuredLogger {
    pub fn new(context_id: String, account: Address) -> Self {
        Self {
            context_id,
            account,
        }
    }

    /// Logger with a fresh context id
    pub fn detached(account: Address) -> Self {
        Self::new(Uuid::new_v4().to_string(), account)
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_tx_sent(&self, operation: &str, link: &str) {
        tracing::info!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            "📤 Transaction sent: {}",
            link
        );
    }

    pub fn log_tx_confirmed(&self, operation: &str, link: &str, block_number: Option<u64>) {
        tracing::info!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            block = ?block_number,
            "✅ {} confirmed! TX: {}",
            operation,
            link
        );
    }

    pub fn log_tx_late_confirmed(&self, operation: &str, link: &str, block_number: Option<u64>) {
        tracing::info!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            block = ?block_number,
            "✅ Late confirmation after wait timeout. TX: {}",
            link
        );
    }

    pub fn log_tx_failed(&self, operation: &str, link: &str, reason: &str) {
        tracing::error!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            reason = %reason,
            "❌ {} failed. TX: {}",
            operation,
            link
        );
    }

    pub fn log_wait_timeout(&self, operation: &str, link: &str, timeout_secs: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            "Transaction wait timed out after {}s, polling receipt: {}",
            timeout_secs,
            link
        );
    }

    pub fn log_skip(&self, operation: &str, reason: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            account = %self.account,
            operation = %operation,
            "⚠️ Skipping: {}",
            reason
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            account = %self.account,
            message = %message,
            "Warning"
        );
    }

    pub fn error(&self, message: &str) {
        tracing::error!(
            context_id = %self.context_id,
            account = %self.account,
            message = %message,
            "Error"
        );
    }
}

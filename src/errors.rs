//! Error taxonomy for chain submission, HTTP calls and configuration.
//!
//! The retry layer only cares about one question: is this failure a
//! gateway-level hiccup (HTTP 502 / "server error") that is worth trying
//! again, or something else? [`BotError::is_transient`] answers it; the
//! classification constructors below decide which variant a raw failure
//! lands in.

use alloy::primitives::TxHash;
use thiserror::Error;

/// Result alias used across the library.
pub type BotResult<T> = Result<T, BotError>;

/// Errors surfaced by executors, the submitter and the loaders.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// Gateway-level failure (HTTP 502 or equivalent server error signal)
    #[error("Transient network error: {message}")]
    TransientNetwork { message: String },

    /// RPC rejection, revert, or any other chain-side failure
    #[error("Chain submission error: {message}")]
    ChainSubmission {
        message: String,
        tx_hash: Option<TxHash>,
    },

    /// Confirmation wait expired and no successful receipt was found
    #[error("Transaction {tx_hash} unresolved after {timeout_secs}s: {link}")]
    ConfirmationTimeout {
        tx_hash: TxHash,
        timeout_secs: u64,
        link: String,
    },

    /// Non-gateway HTTP failure from the storage indexer or image source
    #[error("HTTP error: {message} (status: {status:?})")]
    Http { status: Option<u16>, message: String },

    /// Malformed payload or response
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Fatal configuration problem (missing key file, invalid settings)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BotError {
    /// Check if this error should always be retried up to the ceiling
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::TransientNetwork { .. } => true,
            BotError::Http { status, .. } => *status == Some(502),

            BotError::ChainSubmission { .. } => false,
            BotError::ConfirmationTimeout { .. } => false,
            BotError::Encoding(_) => false,
            BotError::Configuration(_) => false,
        }
    }

    /// Fatal errors stop the process instead of the current unit of work
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Configuration(_))
    }

    /// Transaction hash associated with this error, if any
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            BotError::ChainSubmission { tx_hash, .. } => *tx_hash,
            BotError::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Classify a chain-client failure by its message.
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_gateway_message(&message) {
            BotError::TransientNetwork { message }
        } else {
            BotError::ChainSubmission {
                message,
                tx_hash: None,
            }
        }
    }

    /// Classify an HTTP status returned by an off-chain service.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("status {}", status)
        } else {
            format!("status {}: {}", status, truncate(body, 200))
        };

        if status == 502 {
            BotError::TransientNetwork { message }
        } else {
            BotError::Http {
                status: Some(status),
                message,
            }
        }
    }

    pub fn reverted(tx_hash: TxHash, link: &str) -> Self {
        BotError::ChainSubmission {
            message: format!("Transaction failed: {}", link),
            tx_hash: Some(tx_hash),
        }
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => BotError::from_http_status(status.as_u16(), &err.to_string()),
            None if is_gateway_message(&err.to_string()) => BotError::TransientNetwork {
                message: err.to_string(),
            },
            None => BotError::Http {
                status: None,
                message: err.to_string(),
            },
        }
    }
}

/// Gateway signals seen from JSON-RPC providers and reverse proxies.
fn is_gateway_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("502 bad gateway")
        || lower.contains("bad gateway")
        || lower.contains("http error 502")
        || lower.contains("status 502")
        || lower.contains("server_error")
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_messages_are_transient() {
        let err = BotError::from_rpc_message("server returned an error response: 502 Bad Gateway");
        assert!(err.is_transient());

        let err = BotError::from_rpc_message("HTTP error 502 with body: <html>");
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_rpc_messages_are_not_transient() {
        let err = BotError::from_rpc_message("execution reverted");
        assert!(!err.is_transient());
        assert!(matches!(err, BotError::ChainSubmission { .. }));

        let err = BotError::from_rpc_message("insufficient funds for gas * price + value");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_http_status_classification() {
        assert!(BotError::from_http_status(502, "").is_transient());
        assert!(!BotError::from_http_status(500, "oops").is_transient());
        assert!(!BotError::from_http_status(404, "").is_transient());
    }

    #[test]
    fn test_configuration_is_fatal() {
        assert!(BotError::Configuration("no keys".into()).is_fatal());
        assert!(!BotError::from_rpc_message("nonce too low").is_fatal());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}

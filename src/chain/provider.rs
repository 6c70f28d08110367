//! alloy-backed [`ChainClient`].

use super::{ChainClient, ChainConnector, TxReceipt, TxRequest};
use crate::errors::{BotError, BotResult};
use crate::wallet::Account;
use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{
        DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider,
        ProviderBuilder, WatchTxError,
    },
    rpc::types::TransactionRequest,
    transports::{http::reqwest::Url, RpcError, TransportErrorKind},
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Wallet-backed HTTP provider for a single account
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
    address: Address,
}

impl AlloyChainClient {
    pub fn connect(rpc_url: &Url, account: &Account) -> Self {
        let wallet = EthereumWallet::from(account.signer().clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(rpc_url.clone())
            .erased();

        debug!(account = %account.address(), rpc = %rpc_url, "Connected provider");
        Self {
            provider,
            address: account.address(),
        }
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn call(&self, to: Address, input: Bytes) -> BotResult<Bytes> {
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(to)
            .with_input(input);
        self.provider.call(tx).await.map_err(|e| classify(&e))
    }

    async fn send(&self, request: TxRequest) -> BotResult<TxHash> {
        let mut tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(request.to)
            .with_input(request.input);
        if let Some(gas_limit) = request.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| classify(&e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Option<Duration>,
    ) -> BotResult<TxReceipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_timeout(timeout)
            .get_receipt()
            .await;

        match receipt {
            Ok(receipt) => Ok(to_receipt(&receipt)),
            Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => {
                Err(BotError::ConfirmationTimeout {
                    tx_hash,
                    timeout_secs: timeout.map(|t| t.as_secs()).unwrap_or_default(),
                    link: String::new(),
                })
            }
            Err(PendingTransactionError::TransportError(e)) => Err(classify(&e)),
            Err(e) => Err(BotError::from_rpc_message(e.to_string())),
        }
    }

    async fn receipt(&self, tx_hash: TxHash) -> BotResult<Option<TxReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| classify(&e))?;
        Ok(receipt.as_ref().map(to_receipt))
    }
}

fn to_receipt<R: ReceiptResponse>(receipt: &R) -> TxReceipt {
    TxReceipt {
        tx_hash: receipt.transaction_hash(),
        block_number: receipt.block_number(),
        success: receipt.status(),
        gas_used: receipt.gas_used(),
    }
}

/// HTTP 502 from the node is transient; everything else goes through the
/// message classifier.
fn classify(err: &RpcError<TransportErrorKind>) -> BotError {
    match err {
        RpcError::Transport(TransportErrorKind::HttpError(http)) if http.status == 502 => {
            BotError::TransientNetwork {
                message: format!("HTTP error 502: {}", http.body),
            }
        }
        other => BotError::from_rpc_message(other.to_string()),
    }
}

/// Connects every account to the same RPC endpoint
#[derive(Debug, Clone)]
pub struct AlloyConnector {
    rpc_url: Url,
}

impl AlloyConnector {
    pub fn new(rpc_url: &str) -> BotResult<Self> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| BotError::Configuration(format!("invalid rpc_url '{}': {}", rpc_url, e)))?;
        Ok(Self { rpc_url })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl ChainConnector for AlloyConnector {
    type Client = AlloyChainClient;

    fn connect(&self, account: &Account) -> BotResult<Self::Client> {
        Ok(AlloyChainClient::connect(&self.rpc_url, account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::transports::HttpError;

    #[test]
    fn test_http_502_is_transient() {
        let err = RpcError::Transport(TransportErrorKind::HttpError(HttpError {
            status: 502,
            body: "<html>Bad Gateway</html>".into(),
        }));
        assert!(classify(&err).is_transient());
    }

    #[test]
    fn test_other_http_status_is_not_transient() {
        let err = RpcError::Transport(TransportErrorKind::HttpError(HttpError {
            status: 429,
            body: "rate limited".into(),
        }));
        assert!(!classify(&err).is_transient());
    }

    #[test]
    fn test_connector_rejects_bad_url() {
        assert!(AlloyConnector::new("not a url").is_err());
        assert!(AlloyConnector::new("https://evmrpc-testnet.0g.ai").is_ok());
    }
}

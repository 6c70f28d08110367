//! Transaction submission with confirmation wait and receipt reconciliation.
//!
//! A wait timeout is not a failure by itself: the submitter asks the chain
//! for the receipt directly and only reports a failure when that lookup
//! comes back reverted or empty.

use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::errors::{BotError, BotResult};
use crate::metrics::metrics;
use crate::results::{ResultSink, TxRecord};
use crate::structured_logging::{ExplorerLink, StructuredLogger};
use alloy::primitives::TxHash;
use chrono::Utc;
use std::time::Duration;

/// Terminal outcome of one broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed(TxReceipt),
    Failed {
        tx_hash: TxHash,
        reason: String,
        receipt: Option<TxReceipt>,
    },
    TimedOutButConfirmed(TxReceipt),
    TimedOutUnresolved {
        tx_hash: TxHash,
        timeout_secs: u64,
    },
}

impl TxOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed(_) | TxOutcome::TimedOutButConfirmed(_))
    }

    pub fn tx_hash(&self) -> TxHash {
        match self {
            TxOutcome::Confirmed(r) | TxOutcome::TimedOutButConfirmed(r) => r.tx_hash,
            TxOutcome::Failed { tx_hash, .. } | TxOutcome::TimedOutUnresolved { tx_hash, .. } => {
                *tx_hash
            }
        }
    }

    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            TxOutcome::Confirmed(r) | TxOutcome::TimedOutButConfirmed(r) => Some(r),
            TxOutcome::Failed { receipt, .. } => receipt.as_ref(),
            TxOutcome::TimedOutUnresolved { .. } => None,
        }
    }

    /// Confirmed receipt, or the error the retry policy should judge
    pub fn into_result(self, explorer: &ExplorerLink) -> BotResult<TxReceipt> {
        match self {
            TxOutcome::Confirmed(r) | TxOutcome::TimedOutButConfirmed(r) => Ok(r),
            TxOutcome::Failed { tx_hash, .. } => {
                Err(BotError::reverted(tx_hash, &explorer.tx(&tx_hash)))
            }
            TxOutcome::TimedOutUnresolved {
                tx_hash,
                timeout_secs,
            } => Err(BotError::ConfirmationTimeout {
                tx_hash,
                timeout_secs,
                link: explorer.tx(&tx_hash),
            }),
        }
    }
}

/// Sends transactions for one account.
pub struct TxSubmitter<'a, C: ChainClient> {
    chain: &'a C,
    explorer: &'a ExplorerLink,
    logger: &'a StructuredLogger,
    sink: &'a ResultSink,
}

impl<'a, C: ChainClient> TxSubmitter<'a, C> {
    pub fn new(
        chain: &'a C,
        explorer: &'a ExplorerLink,
        logger: &'a StructuredLogger,
        sink: &'a ResultSink,
    ) -> Self {
        Self {
            chain,
            explorer,
            logger,
            sink,
        }
    }

    pub fn chain(&self) -> &'a C {
        self.chain
    }

    pub fn explorer(&self) -> &'a ExplorerLink {
        self.explorer
    }

    pub fn logger(&self) -> &'a StructuredLogger {
        self.logger
    }

    /// Broadcast `request` and resolve its outcome.
    ///
    /// Errors are returned only for failures before broadcast or during a
    /// wait that did not time out; they are for the retry policy to judge.
    pub async fn submit(
        &self,
        operation: &str,
        request: TxRequest,
        timeout: Option<Duration>,
    ) -> BotResult<TxOutcome> {
        let tx_hash = self.chain.send(request).await?;
        metrics().tx_submitted.inc();

        let link = self.explorer.tx(&tx_hash);
        self.logger.log_tx_sent(operation, &link);

        let outcome = match self.chain.wait_for_receipt(tx_hash, timeout).await {
            Ok(receipt) if receipt.success => TxOutcome::Confirmed(receipt),
            Ok(receipt) => TxOutcome::Failed {
                tx_hash,
                reason: "reverted".to_string(),
                receipt: Some(receipt),
            },
            Err(BotError::ConfirmationTimeout { timeout_secs, .. }) => {
                self.logger.log_wait_timeout(operation, &link, timeout_secs);
                self.reconcile(tx_hash, timeout_secs).await
            }
            Err(e) => return Err(e),
        };

        self.report(operation, &link, &outcome);
        Ok(outcome)
    }

    async fn reconcile(&self, tx_hash: TxHash, timeout_secs: u64) -> TxOutcome {
        match self.chain.receipt(tx_hash).await {
            Ok(Some(receipt)) if receipt.success => TxOutcome::TimedOutButConfirmed(receipt),
            Ok(Some(receipt)) => TxOutcome::Failed {
                tx_hash,
                reason: "reverted (found after wait timeout)".to_string(),
                receipt: Some(receipt),
            },
            Ok(None) => TxOutcome::TimedOutUnresolved {
                tx_hash,
                timeout_secs,
            },
            Err(e) => {
                self.logger
                    .warn(&format!("Receipt lookup for {} failed: {}", tx_hash, e));
                TxOutcome::TimedOutUnresolved {
                    tx_hash,
                    timeout_secs,
                }
            }
        }
    }

    fn report(&self, operation: &str, link: &str, outcome: &TxOutcome) {
        match outcome {
            TxOutcome::Confirmed(receipt) => {
                metrics().tx_confirmed.inc();
                self.logger
                    .log_tx_confirmed(operation, link, receipt.block_number);
                self.save(operation, link, receipt, false);
            }
            TxOutcome::TimedOutButConfirmed(receipt) => {
                metrics().tx_late_confirmed.inc();
                self.logger
                    .log_tx_late_confirmed(operation, link, receipt.block_number);
                self.save(operation, link, receipt, true);
            }
            TxOutcome::Failed { reason, .. } => {
                metrics().tx_failed.inc();
                self.logger.log_tx_failed(operation, link, reason);
            }
            TxOutcome::TimedOutUnresolved { .. } => {
                metrics().tx_failed.inc();
                self.logger
                    .log_tx_failed(operation, link, "failed or still pending");
            }
        }
    }

    fn save(&self, operation: &str, link: &str, receipt: &TxReceipt, late: bool) {
        self.sink.record(&TxRecord {
            operation: operation.to_string(),
            account: self.chain.address(),
            link: link.to_string(),
            late_confirmation: late,
            receipt: receipt.clone(),
            recorded_at: Utc::now(),
        });
    }
}

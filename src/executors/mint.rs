//! Faucet mint phase

use super::{escalate_fatal, pause, submit_with_retry};
use crate::chain::contracts::mint_calldata;
use crate::chain::ChainClient;
use crate::config::{Config, SubmissionProfile, TokenConfig};
use crate::errors::BotResult;
use crate::submitter::TxSubmitter;
use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MintSummary {
    pub minted: usize,
    pub failed: usize,
}

pub struct MintExecutor<'a, C: ChainClient> {
    submitter: &'a TxSubmitter<'a, C>,
    tokens: &'a [TokenConfig],
    profile: &'a SubmissionProfile,
    delay_ms: u64,
}

impl<'a, C: ChainClient> MintExecutor<'a, C> {
    pub fn new(submitter: &'a TxSubmitter<'a, C>, config: &'a Config) -> Self {
        Self {
            submitter,
            tokens: &config.tokens,
            profile: &config.retry.mint,
            delay_ms: config.mint.delay_ms,
        }
    }

    /// Mint every token once, in order. One token failing never stops the rest.
    pub async fn run(&self) -> BotResult<MintSummary> {
        let mut summary = MintSummary::default();

        for token in self.tokens {
            info!("🔵 Minting {}...", token.symbol);
            let operation = format!("Mint {}", token.symbol);

            match submit_with_retry(
                self.submitter,
                &operation,
                self.profile,
                token.address,
                mint_calldata(),
            )
            .await
            {
                Ok(_) => summary.minted += 1,
                Err(e) => {
                    summary.failed += 1;
                    self.submitter
                        .logger()
                        .error(&format!("Mint {} failed: {}", token.symbol, e));
                    escalate_fatal(e)?;
                }
            }

            pause(self.delay_ms).await;
        }

        Ok(summary)
    }
}
